//! Persistence layer: the [`PondStore`] port and its adapters.
//!
//! Services only talk to `Arc<dyn PondStore>`. Two adapters exist:
//!
//! - [`memory::InMemoryStore`] keeps every table behind one lock. Used
//!   when persistence is disabled and throughout the tests.
//! - [`postgres::PostgresStore`] uses `sqlx::PgPool` with the schema in
//!   `migrations/`.
//!
//! Both adapters implement [`PondStore::transfer_pet_ownership`] as a
//! single atomic unit: either the listing is deactivated, the pet owner
//! reassigned and both balances moved, or nothing changes.

pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::purchase::{TransferRequest, TransferResponse};
use crate::domain::{LedgerEntry, Pet, PetId, Profile, SaleId, SaleListing, UserId, Vital};
use crate::error::PondError;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

/// One page of active listings plus the total number of active listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalePage {
    /// Listings on this page, newest first.
    pub listings: Vec<SaleListing>,
    /// Total active listings across all pages.
    pub total: u64,
}

/// Keyed-record store behind every service.
#[async_trait]
pub trait PondStore: Send + Sync + Debug {
    /// Stores a new profile.
    ///
    /// # Errors
    ///
    /// [`PondError::Conflict`] if the username is taken (case-insensitive).
    async fn insert_profile(&self, profile: &Profile) -> Result<(), PondError>;

    /// Loads a profile by id.
    ///
    /// # Errors
    ///
    /// [`PondError::PersistenceError`] on storage failure.
    async fn get_profile(&self, id: UserId) -> Result<Option<Profile>, PondError>;

    /// Stores a new pet.
    ///
    /// # Errors
    ///
    /// [`PondError::ProfileNotFound`] if the owner does not exist.
    async fn insert_pet(&self, pet: &Pet) -> Result<(), PondError>;

    /// Loads a pet by id.
    ///
    /// # Errors
    ///
    /// [`PondError::PersistenceError`] on storage failure.
    async fn get_pet(&self, id: PetId) -> Result<Option<Pet>, PondError>;

    /// Sets `vital` to full with `at` as its interaction timestamp,
    /// returning the updated pet.
    ///
    /// # Errors
    ///
    /// [`PondError::PersistenceError`] on storage failure.
    async fn refill_vital(
        &self,
        id: PetId,
        vital: Vital,
        at: DateTime<Utc>,
    ) -> Result<Option<Pet>, PondError>;

    /// Stores a new active listing.
    ///
    /// # Errors
    ///
    /// [`PondError::Conflict`] if the pet already has an active listing.
    async fn insert_sale(&self, sale: &SaleListing) -> Result<(), PondError>;

    /// Loads a listing by id, active or not.
    ///
    /// # Errors
    ///
    /// [`PondError::PersistenceError`] on storage failure.
    async fn get_sale(&self, id: SaleId) -> Result<Option<SaleListing>, PondError>;

    /// Finds the active listing of `pet_id` created by `seller_id`.
    ///
    /// # Errors
    ///
    /// [`PondError::PersistenceError`] on storage failure.
    async fn find_active_sale(
        &self,
        pet_id: PetId,
        seller_id: UserId,
    ) -> Result<Option<SaleListing>, PondError>;

    /// Deactivates a listing. Returns `false` if it was already inactive.
    ///
    /// # Errors
    ///
    /// [`PondError::PersistenceError`] on storage failure.
    async fn deactivate_sale(&self, id: SaleId) -> Result<bool, PondError>;

    /// Returns one page of active listings, newest first.
    ///
    /// # Errors
    ///
    /// [`PondError::PersistenceError`] on storage failure.
    async fn list_active_sales(&self, offset: u64, limit: u64) -> Result<SalePage, PondError>;

    /// Atomically moves the pet and the price between seller and buyer and
    /// deactivates the listing.
    ///
    /// A rule violation detected inside the unit is reported as
    /// `Ok(TransferResponse { success: false, .. })` with nothing applied.
    ///
    /// # Errors
    ///
    /// [`PondError::PersistenceError`] if the store could not be reached;
    /// nothing was applied.
    async fn transfer_pet_ownership(
        &self,
        request: &TransferRequest,
    ) -> Result<TransferResponse, PondError>;

    /// Appends ledger rows.
    ///
    /// # Errors
    ///
    /// [`PondError::PersistenceError`] on storage failure.
    async fn record_ledger_entries(&self, entries: &[LedgerEntry]) -> Result<(), PondError>;

    /// Returns a user's ledger rows, newest first.
    ///
    /// # Errors
    ///
    /// [`PondError::PersistenceError`] on storage failure.
    async fn ledger_for(&self, user_id: UserId) -> Result<Vec<LedgerEntry>, PondError>;
}

/// Messages shared by both adapters when the transfer unit rejects.
pub(crate) mod rejection {
    pub const SALE_INACTIVE: &str = "sale no longer active";
    pub const PRICE_CHANGED: &str = "sale price changed";
    pub const NOT_OWNER: &str = "seller no longer owns this pet";
    pub const SELF_PURCHASE: &str = "cannot buy your own pet";
    pub const INSUFFICIENT_FUNDS: &str = "insufficient funds";
    pub const UNKNOWN_PROFILE: &str = "buyer or seller profile not found";
    pub const BALANCE_OVERFLOW: &str = "balance out of range";
}
