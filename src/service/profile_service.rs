//! Profile service: registration, balance lookups, ledger history.

use std::sync::Arc;

use crate::domain::{Clock, LedgerEntry, Profile, UserId};
use crate::error::PondError;
use crate::persistence::PondStore;

const USERNAME_MIN_LEN: usize = 3;
const USERNAME_MAX_LEN: usize = 32;

/// Profile operations.
#[derive(Debug, Clone)]
pub struct ProfileService {
    store: Arc<dyn PondStore>,
    clock: Arc<dyn Clock>,
}

impl ProfileService {
    /// Creates a new `ProfileService`.
    #[must_use]
    pub fn new(store: Arc<dyn PondStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Registers a new profile.
    ///
    /// # Errors
    ///
    /// [`PondError::InvalidRequest`] for a malformed username or a negative
    /// balance, [`PondError::Conflict`] if the username is taken.
    pub async fn create_profile(
        &self,
        username: &str,
        starting_balance: i64,
    ) -> Result<Profile, PondError> {
        let username = username.trim();
        validate_username(username)?;
        if starting_balance < 0 {
            return Err(PondError::InvalidRequest(
                "starting balance must not be negative".to_string(),
            ));
        }

        let profile = Profile::new(username.to_string(), starting_balance, self.clock.now());
        self.store.insert_profile(&profile).await?;

        tracing::info!(user_id = %profile.id, username, "profile created");
        Ok(profile)
    }

    /// Loads a profile.
    ///
    /// # Errors
    ///
    /// [`PondError::ProfileNotFound`] if it does not exist.
    pub async fn get_profile(&self, id: UserId) -> Result<Profile, PondError> {
        self.store
            .get_profile(id)
            .await?
            .ok_or(PondError::ProfileNotFound(id))
    }

    /// Returns the ledger rows of a user, newest first.
    ///
    /// # Errors
    ///
    /// [`PondError::ProfileNotFound`] if the user does not exist.
    pub async fn ledger_for(&self, id: UserId) -> Result<Vec<LedgerEntry>, PondError> {
        self.get_profile(id).await?;
        self.store.ledger_for(id).await
    }
}

fn validate_username(username: &str) -> Result<(), PondError> {
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(PondError::InvalidRequest(format!(
            "username must be {USERNAME_MIN_LEN}-{USERNAME_MAX_LEN} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    {
        return Err(PondError::InvalidRequest(
            "username may only contain letters, digits, '_' and '-'".to_string(),
        ));
    }
    Ok(())
}
