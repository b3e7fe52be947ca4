//! User profiles: username and ND balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;

/// A platform user as seen by the marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    /// User identifier.
    pub id: UserId,
    /// Unique (case-insensitively) display name.
    pub username: String,
    /// Spendable ND balance.
    pub balance: i64,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Creates a profile with the given starting balance.
    #[must_use]
    pub fn new(username: String, balance: i64, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            username,
            balance,
            created_at: now,
        }
    }
}
