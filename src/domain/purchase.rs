//! Purchase eligibility rules and the per-attempt state machine.
//!
//! ```text
//! Idle ─► Validating ─┬─► Eligible ─► Transferring ─┬─► Succeeded
//!            ▲        └─► Blocked                   └─► Failed
//!            └──────────── (re-validation) ◄────────────┘
//! ```
//!
//! Validation failures are values ([`BlockReason`]), not errors: the
//! caller renders them inline and may validate again at any time.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::pet::Pet;
use super::profile::Profile;
use super::sale::SaleListing;
use super::{PetId, UserId};

/// Why a purchase may not go ahead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum BlockReason {
    /// No active listing for this pet and seller.
    SaleInactive,
    /// The pet record is gone.
    PetMissing,
    /// The pet changed hands since it was listed.
    SellerNoLongerOwner,
    /// The buyer is the seller.
    SelfPurchase,
    /// The buyer has no profile.
    BuyerMissing,
    /// The listing is reserved for another user.
    ReservedFor {
        /// Username the listing is reserved for.
        target_username: String,
    },
    /// The buyer cannot afford the price.
    InsufficientFunds {
        /// Buyer balance in ND.
        balance: i64,
        /// Listing price in ND.
        price: i64,
    },
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SaleInactive => write!(f, "sale no longer active"),
            Self::PetMissing => write!(f, "pet no longer exists"),
            Self::SellerNoLongerOwner => write!(f, "seller no longer owns this pet"),
            Self::SelfPurchase => write!(f, "cannot buy your own pet"),
            Self::BuyerMissing => write!(f, "buyer profile not found"),
            Self::ReservedFor { target_username } => write!(f, "reserved for {target_username}"),
            Self::InsufficientFunds { balance, price } => write!(
                f,
                "insufficient funds: you have {balance} ND but the price is {price} ND (short {} ND)",
                price.saturating_sub(*balance)
            ),
        }
    }
}

/// Outcome of a validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    /// The buyer may purchase this listing.
    Eligible(SaleListing),
    /// The purchase is blocked.
    Blocked(BlockReason),
}

impl Eligibility {
    /// Returns `true` for [`Eligibility::Eligible`].
    #[must_use]
    pub const fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible(_))
    }

    /// Returns the block reason, if any.
    #[must_use]
    pub const fn block_reason(&self) -> Option<&BlockReason> {
        match self {
            Self::Eligible(_) => None,
            Self::Blocked(reason) => Some(reason),
        }
    }
}

/// Records loaded for one validation pass.
#[derive(Debug, Clone, Copy)]
pub struct PurchaseContext<'a> {
    /// Active listing for `(pet, seller)`, if one exists.
    pub sale: Option<&'a SaleListing>,
    /// Pet as currently stored.
    pub pet: Option<&'a Pet>,
    /// Acting user.
    pub buyer_id: UserId,
    /// Acting user's profile.
    pub buyer: Option<&'a Profile>,
}

/// Applies the purchase rules in order, returning the first that fails.
#[must_use]
pub fn evaluate_purchase(ctx: &PurchaseContext<'_>) -> Eligibility {
    let Some(sale) = ctx.sale.filter(|s| s.is_active) else {
        return Eligibility::Blocked(BlockReason::SaleInactive);
    };

    let Some(pet) = ctx.pet else {
        return Eligibility::Blocked(BlockReason::PetMissing);
    };
    if pet.id != sale.user_pet_id || pet.user_id != sale.seller_id {
        return Eligibility::Blocked(BlockReason::SellerNoLongerOwner);
    }

    if ctx.buyer_id == sale.seller_id {
        return Eligibility::Blocked(BlockReason::SelfPurchase);
    }

    let Some(buyer) = ctx.buyer.filter(|b| b.id == ctx.buyer_id) else {
        return Eligibility::Blocked(BlockReason::BuyerMissing);
    };

    if let Some(target) = &sale.target_username
        && !sale.admits(&buyer.username)
    {
        return Eligibility::Blocked(BlockReason::ReservedFor {
            target_username: target.clone(),
        });
    }

    if buyer.balance < sale.price_nd {
        return Eligibility::Blocked(BlockReason::InsufficientFunds {
            balance: buyer.balance,
            price: sale.price_nd,
        });
    }

    Eligibility::Eligible(sale.clone())
}

/// Arguments of the atomic ownership transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Pet changing hands.
    pub pet_id: PetId,
    /// Current owner and listing seller.
    pub seller_id: UserId,
    /// New owner.
    pub buyer_id: UserId,
    /// Price the buyer agreed to. Must equal the listing price.
    pub sale_price: i64,
}

/// Structured result of the atomic ownership transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResponse {
    /// Whether every effect was applied.
    pub success: bool,
    /// Why nothing was applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Informational message on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TransferResponse {
    /// A committed transfer.
    #[must_use]
    pub fn committed(message: impl Into<String>) -> Self {
        Self {
            success: true,
            error: None,
            message: Some(message.into()),
        }
    }

    /// A transfer that applied nothing.
    #[must_use]
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            message: None,
        }
    }
}

/// Where a purchase attempt currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PurchaseState {
    /// Nothing checked yet.
    Idle,
    /// Loading records and applying the rules.
    Validating,
    /// All rules pass.
    Eligible,
    /// A rule failed.
    Blocked {
        /// The failing rule.
        reason: BlockReason,
    },
    /// The atomic transfer is in flight.
    Transferring,
    /// Ownership and currency moved.
    Succeeded,
    /// The transfer applied nothing.
    Failed {
        /// Error surfaced to the buyer.
        error: String,
    },
}

impl PurchaseState {
    /// Short state name for logs and errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Eligible => "eligible",
            Self::Blocked { .. } => "blocked",
            Self::Transferring => "transferring",
            Self::Succeeded => "succeeded",
            Self::Failed { .. } => "failed",
        }
    }
}

/// An illegal state machine move.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid purchase transition from {from} to {to}")]
pub struct InvalidTransition {
    /// State the attempt was in.
    pub from: &'static str,
    /// State that was requested.
    pub to: &'static str,
}

/// State machine for a single purchase attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseAttempt {
    state: PurchaseState,
}

impl PurchaseAttempt {
    /// Starts a new attempt in [`PurchaseState::Idle`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: PurchaseState::Idle,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &PurchaseState {
        &self.state
    }

    /// Consumes the attempt, returning its final state.
    #[must_use]
    pub fn into_state(self) -> PurchaseState {
        self.state
    }

    /// Enters `Validating`. Allowed from every state except
    /// `Transferring`, `Succeeded` and `Validating` itself.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] from a disallowed state.
    pub fn begin_validation(&mut self) -> Result<(), InvalidTransition> {
        match self.state {
            PurchaseState::Idle
            | PurchaseState::Eligible
            | PurchaseState::Blocked { .. }
            | PurchaseState::Failed { .. } => {
                self.state = PurchaseState::Validating;
                Ok(())
            }
            _ => Err(self.invalid("validating")),
        }
    }

    /// Records the outcome of a validation pass.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] unless the attempt is `Validating`.
    pub fn finish_validation(&mut self, eligibility: &Eligibility) -> Result<(), InvalidTransition> {
        if self.state != PurchaseState::Validating {
            let to = if eligibility.is_eligible() { "eligible" } else { "blocked" };
            return Err(self.invalid(to));
        }
        self.state = match eligibility {
            Eligibility::Eligible(_) => PurchaseState::Eligible,
            Eligibility::Blocked(reason) => PurchaseState::Blocked {
                reason: reason.clone(),
            },
        };
        Ok(())
    }

    /// Enters `Transferring`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] unless the attempt is `Eligible`.
    pub fn begin_transfer(&mut self) -> Result<(), InvalidTransition> {
        if self.state != PurchaseState::Eligible {
            return Err(self.invalid("transferring"));
        }
        self.state = PurchaseState::Transferring;
        Ok(())
    }

    /// Marks the transfer as committed.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] unless the attempt is `Transferring`.
    pub fn succeed(&mut self) -> Result<(), InvalidTransition> {
        if self.state != PurchaseState::Transferring {
            return Err(self.invalid("succeeded"));
        }
        self.state = PurchaseState::Succeeded;
        Ok(())
    }

    /// Marks the transfer as failed with `error`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] unless the attempt is `Transferring`.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), InvalidTransition> {
        if self.state != PurchaseState::Transferring {
            return Err(self.invalid("failed"));
        }
        self.state = PurchaseState::Failed {
            error: error.into(),
        };
        Ok(())
    }

    fn invalid(&self, to: &'static str) -> InvalidTransition {
        InvalidTransition {
            from: self.state.name(),
            to,
        }
    }
}

impl Default for PurchaseAttempt {
    fn default() -> Self {
        Self::new()
    }
}
