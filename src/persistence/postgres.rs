//! PostgreSQL implementation of the persistence layer.
//!
//! The ownership transfer runs as one transaction whose first statement
//! flips the listing's `is_active` flag with a conditional `UPDATE`.
//! Concurrent buyers serialize on that row lock; once the winner commits,
//! the losers' `WHERE is_active` no longer matches and they roll back
//! without touching anything.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::models::{LedgerRow, PetRow, ProfileRow, SaleRow};
use super::{PondStore, SalePage, rejection};
use crate::config::PondConfig;
use crate::domain::purchase::{TransferRequest, TransferResponse};
use crate::domain::{LedgerEntry, Pet, PetId, Profile, SaleId, SaleListing, UserId, Vital};
use crate::error::PondError;

const PET_COLUMNS: &str = "id, user_id, name, friendliness, playfulness, energy, loyalty, curiosity, \
                           hunger, water, last_fed, last_watered, created_at";

const SALE_COLUMNS: &str =
    "id, user_pet_id, seller_id, price_nd, is_active, target_username, created_at";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool sized from `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`PondError::PersistenceError`] if the database cannot be
    /// reached.
    pub async fn connect(config: &PondConfig) -> Result<Self, PondError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .map_err(db_err)?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`PondError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), PondError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| PondError::PersistenceError(e.to_string()))
    }
}

#[async_trait]
impl PondStore for PostgresStore {
    async fn insert_profile(&self, profile: &Profile) -> Result<(), PondError> {
        sqlx::query("INSERT INTO profiles (id, username, balance, created_at) VALUES ($1, $2, $3, $4)")
            .bind(profile.id.as_uuid())
            .bind(&profile.username)
            .bind(profile.balance)
            .bind(profile.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    PondError::Conflict(format!("username {} is taken", profile.username))
                } else {
                    db_err(e)
                }
            })?;
        Ok(())
    }

    async fn get_profile(&self, id: UserId) -> Result<Option<Profile>, PondError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, username, balance, created_at FROM profiles WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(Profile::from))
    }

    async fn insert_pet(&self, pet: &Pet) -> Result<(), PondError> {
        let p = &pet.personality;
        sqlx::query(
            "INSERT INTO user_pets (id, user_id, name, friendliness, playfulness, energy, loyalty, \
             curiosity, hunger, water, last_fed, last_watered, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(pet.id.as_uuid())
        .bind(pet.user_id.as_uuid())
        .bind(&pet.name)
        .bind(p.friendliness)
        .bind(p.playfulness)
        .bind(p.energy)
        .bind(p.loyalty)
        .bind(p.curiosity)
        .bind(pet.hunger)
        .bind(pet.water)
        .bind(pet.last_fed)
        .bind(pet.last_watered)
        .bind(pet.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                PondError::ProfileNotFound(pet.user_id)
            } else {
                db_err(e)
            }
        })?;
        Ok(())
    }

    async fn get_pet(&self, id: PetId) -> Result<Option<Pet>, PondError> {
        let row = sqlx::query_as::<_, PetRow>(&format!(
            "SELECT {PET_COLUMNS} FROM user_pets WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(Pet::from))
    }

    async fn refill_vital(
        &self,
        id: PetId,
        vital: Vital,
        at: DateTime<Utc>,
    ) -> Result<Option<Pet>, PondError> {
        let assignment = match vital {
            Vital::Hunger => "hunger = 100, last_fed = $2",
            Vital::Water => "water = 100, last_watered = $2",
        };
        let row = sqlx::query_as::<_, PetRow>(&format!(
            "UPDATE user_pets SET {assignment} WHERE id = $1 RETURNING {PET_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(Pet::from))
    }

    async fn insert_sale(&self, sale: &SaleListing) -> Result<(), PondError> {
        sqlx::query(&format!(
            "INSERT INTO pet_sales ({SALE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
        ))
        .bind(sale.id.as_uuid())
        .bind(sale.user_pet_id.as_uuid())
        .bind(sale.seller_id.as_uuid())
        .bind(sale.price_nd)
        .bind(sale.is_active)
        .bind(&sale.target_username)
        .bind(sale.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PondError::Conflict(format!("pet {} is already listed", sale.user_pet_id))
            } else {
                db_err(e)
            }
        })?;
        Ok(())
    }

    async fn get_sale(&self, id: SaleId) -> Result<Option<SaleListing>, PondError> {
        let row = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {SALE_COLUMNS} FROM pet_sales WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(SaleListing::from))
    }

    async fn find_active_sale(
        &self,
        pet_id: PetId,
        seller_id: UserId,
    ) -> Result<Option<SaleListing>, PondError> {
        let row = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {SALE_COLUMNS} FROM pet_sales \
             WHERE user_pet_id = $1 AND seller_id = $2 AND is_active"
        ))
        .bind(pet_id.as_uuid())
        .bind(seller_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(SaleListing::from))
    }

    async fn deactivate_sale(&self, id: SaleId) -> Result<bool, PondError> {
        let result = sqlx::query("UPDATE pet_sales SET is_active = FALSE WHERE id = $1 AND is_active")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_active_sales(&self, offset: u64, limit: u64) -> Result<SalePage, PondError> {
        let rows = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {SALE_COLUMNS} FROM pet_sales WHERE is_active \
             ORDER BY created_at DESC, id ASC LIMIT $1 OFFSET $2"
        ))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM pet_sales WHERE is_active")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(SalePage {
            listings: rows.into_iter().map(SaleListing::from).collect(),
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    async fn transfer_pet_ownership(
        &self,
        request: &TransferRequest,
    ) -> Result<TransferResponse, PondError> {
        if request.buyer_id == request.seller_id {
            return Ok(TransferResponse::rejected(rejection::SELF_PURCHASE));
        }

        let mut tx = self.pool.begin().await.map_err(db_err)?;
        match apply_transfer(&mut tx, request).await {
            Ok(Ok(sale_id)) => {
                tx.commit().await.map_err(db_err)?;
                Ok(TransferResponse::committed(format!(
                    "pet {} transferred under sale {sale_id}",
                    request.pet_id
                )))
            }
            Ok(Err(reason)) => {
                tx.rollback().await.map_err(db_err)?;
                tracing::debug!(pet_id = %request.pet_id, reason, "transfer rolled back");
                Ok(TransferResponse::rejected(reason))
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::warn!(error = %rollback, "transfer rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn record_ledger_entries(&self, entries: &[LedgerEntry]) -> Result<(), PondError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        for entry in entries {
            sqlx::query(
                "INSERT INTO nd_ledger (id, user_id, amount, kind, description, pet_id, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(entry.id.as_uuid())
            .bind(entry.user_id.as_uuid())
            .bind(entry.amount)
            .bind(entry.kind.as_str())
            .bind(&entry.description)
            .bind(entry.pet_id.as_uuid())
            .bind(entry.created_at)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }
        tx.commit().await.map_err(db_err)
    }

    async fn ledger_for(&self, user_id: UserId) -> Result<Vec<LedgerEntry>, PondError> {
        let rows = sqlx::query_as::<_, LedgerRow>(
            "SELECT id, user_id, amount, kind, description, pet_id, created_at FROM nd_ledger \
             WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(LedgerEntry::try_from).collect()
    }
}

/// Runs the transfer statements inside `tx`.
///
/// The outer `Result` carries database failures; the inner one carries a
/// rule violation, in which case the caller rolls back.
async fn apply_transfer(
    tx: &mut Transaction<'_, Postgres>,
    req: &TransferRequest,
) -> Result<Result<Uuid, &'static str>, PondError> {
    let sale = sqlx::query_as::<_, (Uuid, i64)>(
        "UPDATE pet_sales SET is_active = FALSE \
         WHERE user_pet_id = $1 AND seller_id = $2 AND is_active \
         RETURNING id, price_nd",
    )
    .bind(req.pet_id.as_uuid())
    .bind(req.seller_id.as_uuid())
    .fetch_optional(&mut **tx)
    .await
    .map_err(db_err)?;

    let Some((sale_id, price)) = sale else {
        return Ok(Err(rejection::SALE_INACTIVE));
    };
    if price != req.sale_price {
        return Ok(Err(rejection::PRICE_CHANGED));
    }

    let moved = sqlx::query("UPDATE user_pets SET user_id = $1 WHERE id = $2 AND user_id = $3")
        .bind(req.buyer_id.as_uuid())
        .bind(req.pet_id.as_uuid())
        .bind(req.seller_id.as_uuid())
        .execute(&mut **tx)
        .await
        .map_err(db_err)?;
    if moved.rows_affected() != 1 {
        return Ok(Err(rejection::NOT_OWNER));
    }

    let balance = sqlx::query_scalar::<_, i64>("SELECT balance FROM profiles WHERE id = $1 FOR UPDATE")
        .bind(req.buyer_id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_err)?;
    match balance {
        None => return Ok(Err(rejection::UNKNOWN_PROFILE)),
        Some(b) if b < req.sale_price => return Ok(Err(rejection::INSUFFICIENT_FUNDS)),
        Some(_) => {}
    }

    sqlx::query("UPDATE profiles SET balance = balance - $1 WHERE id = $2")
        .bind(req.sale_price)
        .bind(req.buyer_id.as_uuid())
        .execute(&mut **tx)
        .await
        .map_err(db_err)?;

    let credited = sqlx::query("UPDATE profiles SET balance = balance + $1 WHERE id = $2")
        .bind(req.sale_price)
        .bind(req.seller_id.as_uuid())
        .execute(&mut **tx)
        .await
        .map_err(db_err)?;
    if credited.rows_affected() != 1 {
        return Ok(Err(rejection::UNKNOWN_PROFILE));
    }

    Ok(Ok(sale_id))
}

fn db_err(e: sqlx::Error) -> PondError {
    PondError::PersistenceError(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}
