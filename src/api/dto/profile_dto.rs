//! Profile DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{LedgerEntry, UserId};

/// Request body for `POST /profiles`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProfileRequest {
    /// Unique display name, 3-32 characters.
    pub username: String,
    /// Initial ND balance. Defaults to 0.
    #[serde(default)]
    pub starting_balance: i64,
}

/// Response body for `GET /profiles/{id}/ledger`.
#[derive(Debug, Serialize, ToSchema)]
pub struct LedgerResponse {
    /// Owner of the entries.
    pub user_id: UserId,
    /// Entries, newest first.
    pub entries: Vec<LedgerEntry>,
}
