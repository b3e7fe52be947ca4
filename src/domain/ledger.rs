//! Currency ledger rows written after a completed purchase.
//!
//! The ledger is an audit trail. Balances are authoritative; a missing
//! ledger row never means a missing transfer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{LedgerEntryId, PetId, UserId};

/// Why a ledger row exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LedgerKind {
    /// Buyer side of a pet purchase (debit).
    Purchase,
    /// Seller side of a pet purchase (credit).
    Sale,
}

impl LedgerKind {
    /// Returns the kind as stored in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Sale => "sale",
        }
    }

    /// Parses a stored kind string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "purchase" => Some(Self::Purchase),
            "sale" => Some(Self::Sale),
            _ => None,
        }
    }
}

/// A single signed movement of ND for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LedgerEntry {
    /// Row identifier.
    pub id: LedgerEntryId,
    /// User whose balance moved.
    pub user_id: UserId,
    /// Signed amount: negative for debits, positive for credits.
    pub amount: i64,
    /// Entry kind.
    pub kind: LedgerKind,
    /// Human readable description.
    pub description: String,
    /// Pet involved.
    pub pet_id: PetId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Builds the buyer debit and seller credit for a completed purchase.
#[must_use]
pub fn purchase_entries(
    pet_id: PetId,
    pet_name: &str,
    buyer: (UserId, &str),
    seller: (UserId, &str),
    price: i64,
    now: DateTime<Utc>,
) -> [LedgerEntry; 2] {
    let (buyer_id, buyer_name) = buyer;
    let (seller_id, seller_name) = seller;
    [
        LedgerEntry {
            id: LedgerEntryId::new(),
            user_id: buyer_id,
            amount: -price,
            kind: LedgerKind::Purchase,
            description: format!("Purchased {pet_name} from {seller_name}"),
            pet_id,
            created_at: now,
        },
        LedgerEntry {
            id: LedgerEntryId::new(),
            user_id: seller_id,
            amount: price,
            kind: LedgerKind::Sale,
            description: format!("Sold {pet_name} to {buyer_name}"),
            pet_id,
            created_at: now,
        },
    ]
}
