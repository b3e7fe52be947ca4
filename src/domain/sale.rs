//! Sale listings on the pet marketplace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{PetId, SaleId, UserId};

/// A pet offered for sale.
///
/// At most one listing per pet is active at a time. A listing with a
/// `target_username` is reserved for that single buyer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SaleListing {
    /// Listing identifier.
    pub id: SaleId,
    /// Pet being sold.
    pub user_pet_id: PetId,
    /// Owner of the pet when the listing was created.
    pub seller_id: UserId,
    /// Asking price in ND. Always positive.
    pub price_nd: i64,
    /// Whether the listing can still be bought.
    pub is_active: bool,
    /// Reserved buyer, matched case-insensitively.
    pub target_username: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl SaleListing {
    /// Creates a new active listing.
    #[must_use]
    pub fn new(
        pet_id: PetId,
        seller_id: UserId,
        price_nd: i64,
        target_username: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SaleId::new(),
            user_pet_id: pet_id,
            seller_id,
            price_nd,
            is_active: true,
            target_username: normalize_target(target_username),
            created_at: now,
        }
    }

    /// Returns `true` if `username` may buy this listing.
    #[must_use]
    pub fn admits(&self, username: &str) -> bool {
        match &self.target_username {
            Some(target) => target.to_lowercase() == username.trim().to_lowercase(),
            None => true,
        }
    }
}

/// Trims a requested reservation, treating a blank one as no reservation.
fn normalize_target(target: Option<String>) -> Option<String> {
    target
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
