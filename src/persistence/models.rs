//! Database row types and their conversion into domain records.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    LedgerEntry, LedgerEntryId, LedgerKind, Personality, Pet, PetId, Profile, SaleId, SaleListing,
    UserId,
};
use crate::error::PondError;

/// A row from the `profiles` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileRow {
    /// User id.
    pub id: Uuid,
    /// Display name.
    pub username: String,
    /// ND balance.
    pub balance: i64,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: UserId::from_uuid(row.id),
            username: row.username,
            balance: row.balance,
            created_at: row.created_at,
        }
    }
}

/// A row from the `user_pets` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PetRow {
    /// Pet id.
    pub id: Uuid,
    /// Owner id.
    pub user_id: Uuid,
    /// Display name.
    pub name: String,
    /// Personality trait.
    pub friendliness: i32,
    /// Personality trait.
    pub playfulness: i32,
    /// Personality trait.
    pub energy: i32,
    /// Personality trait.
    pub loyalty: i32,
    /// Personality trait.
    pub curiosity: i32,
    /// Stored hunger level.
    pub hunger: i32,
    /// Stored water level.
    pub water: i32,
    /// Last feeding instant.
    pub last_fed: Option<DateTime<Utc>>,
    /// Last watering instant.
    pub last_watered: Option<DateTime<Utc>>,
    /// Adoption timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<PetRow> for Pet {
    fn from(row: PetRow) -> Self {
        Self {
            id: PetId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            name: row.name,
            personality: Personality::new(
                row.friendliness,
                row.playfulness,
                row.energy,
                row.loyalty,
                row.curiosity,
            ),
            hunger: row.hunger,
            water: row.water,
            last_fed: row.last_fed,
            last_watered: row.last_watered,
            created_at: row.created_at,
        }
    }
}

/// A row from the `pet_sales` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SaleRow {
    /// Listing id.
    pub id: Uuid,
    /// Pet on sale.
    pub user_pet_id: Uuid,
    /// Seller id.
    pub seller_id: Uuid,
    /// Price in ND.
    pub price_nd: i64,
    /// Whether the listing is open.
    pub is_active: bool,
    /// Reserved buyer.
    pub target_username: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<SaleRow> for SaleListing {
    fn from(row: SaleRow) -> Self {
        Self {
            id: SaleId::from_uuid(row.id),
            user_pet_id: PetId::from_uuid(row.user_pet_id),
            seller_id: UserId::from_uuid(row.seller_id),
            price_nd: row.price_nd,
            is_active: row.is_active,
            target_username: row.target_username,
            created_at: row.created_at,
        }
    }
}

/// A row from the `nd_ledger` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LedgerRow {
    /// Row id.
    pub id: Uuid,
    /// User whose balance moved.
    pub user_id: Uuid,
    /// Signed amount.
    pub amount: i64,
    /// Kind discriminator (`"purchase"` or `"sale"`).
    pub kind: String,
    /// Description.
    pub description: String,
    /// Pet involved.
    pub pet_id: Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<LedgerRow> for LedgerEntry {
    type Error = PondError;

    fn try_from(row: LedgerRow) -> Result<Self, Self::Error> {
        let kind = LedgerKind::parse(&row.kind).ok_or_else(|| {
            PondError::PersistenceError(format!("unknown ledger kind {:?}", row.kind))
        })?;
        Ok(Self {
            id: LedgerEntryId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            amount: row.amount,
            kind,
            description: row.description,
            pet_id: PetId::from_uuid(row.pet_id),
            created_at: row.created_at,
        })
    }
}
