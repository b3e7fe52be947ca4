//! In-memory [`PondStore`] adapter.
//!
//! All tables live behind a single [`tokio::sync::RwLock`]. Reads share
//! the lock; every write, and in particular the whole ownership transfer,
//! runs under the write lock, which makes each call atomic with respect
//! to every other call.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{PondStore, SalePage, rejection};
use crate::domain::purchase::{TransferRequest, TransferResponse};
use crate::domain::{LedgerEntry, Pet, PetId, Profile, SaleId, SaleListing, UserId, Vital};
use crate::error::PondError;

#[derive(Debug, Default)]
struct Tables {
    profiles: HashMap<UserId, Profile>,
    pets: HashMap<PetId, Pet>,
    sales: HashMap<SaleId, SaleListing>,
    ledger: Vec<LedgerEntry>,
}

impl Tables {
    fn username_taken(&self, username: &str) -> bool {
        let wanted = username.to_lowercase();
        self.profiles
            .values()
            .any(|p| p.username.to_lowercase() == wanted)
    }

    fn active_sale_for(&self, pet_id: PetId) -> Option<&SaleListing> {
        self.sales
            .values()
            .find(|s| s.is_active && s.user_pet_id == pet_id)
    }

    fn apply_transfer(&mut self, req: &TransferRequest) -> Result<SaleId, &'static str> {
        if req.buyer_id == req.seller_id {
            return Err(rejection::SELF_PURCHASE);
        }

        let sale = self
            .sales
            .values()
            .find(|s| s.is_active && s.user_pet_id == req.pet_id && s.seller_id == req.seller_id)
            .ok_or(rejection::SALE_INACTIVE)?;
        if sale.price_nd != req.sale_price {
            return Err(rejection::PRICE_CHANGED);
        }
        let sale_id = sale.id;

        match self.pets.get(&req.pet_id) {
            Some(pet) if pet.user_id == req.seller_id => {}
            _ => return Err(rejection::NOT_OWNER),
        }

        let buyer_balance = self
            .profiles
            .get(&req.buyer_id)
            .map(|p| p.balance)
            .ok_or(rejection::UNKNOWN_PROFILE)?;
        let seller_balance = self
            .profiles
            .get(&req.seller_id)
            .map(|p| p.balance)
            .ok_or(rejection::UNKNOWN_PROFILE)?;
        if buyer_balance < req.sale_price {
            return Err(rejection::INSUFFICIENT_FUNDS);
        }
        let (Some(buyer_after), Some(seller_after)) = (
            buyer_balance.checked_sub(req.sale_price),
            seller_balance.checked_add(req.sale_price),
        ) else {
            return Err(rejection::BALANCE_OVERFLOW);
        };

        // Every check passed: nothing below can fail.
        if let Some(buyer) = self.profiles.get_mut(&req.buyer_id) {
            buyer.balance = buyer_after;
        }
        if let Some(seller) = self.profiles.get_mut(&req.seller_id) {
            seller.balance = seller_after;
        }
        if let Some(pet) = self.pets.get_mut(&req.pet_id) {
            pet.user_id = req.buyer_id;
        }
        if let Some(sale) = self.sales.get_mut(&sale_id) {
            sale.is_active = false;
        }
        Ok(sale_id)
    }
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PondStore for InMemoryStore {
    async fn insert_profile(&self, profile: &Profile) -> Result<(), PondError> {
        let mut tables = self.tables.write().await;
        if tables.username_taken(&profile.username) {
            return Err(PondError::Conflict(format!(
                "username {} is taken",
                profile.username
            )));
        }
        tables.profiles.insert(profile.id, profile.clone());
        Ok(())
    }

    async fn get_profile(&self, id: UserId) -> Result<Option<Profile>, PondError> {
        Ok(self.tables.read().await.profiles.get(&id).cloned())
    }

    async fn insert_pet(&self, pet: &Pet) -> Result<(), PondError> {
        let mut tables = self.tables.write().await;
        if !tables.profiles.contains_key(&pet.user_id) {
            return Err(PondError::ProfileNotFound(pet.user_id));
        }
        tables.pets.insert(pet.id, pet.clone());
        Ok(())
    }

    async fn get_pet(&self, id: PetId) -> Result<Option<Pet>, PondError> {
        Ok(self.tables.read().await.pets.get(&id).cloned())
    }

    async fn refill_vital(
        &self,
        id: PetId,
        vital: Vital,
        at: DateTime<Utc>,
    ) -> Result<Option<Pet>, PondError> {
        let mut tables = self.tables.write().await;
        Ok(tables.pets.get_mut(&id).map(|pet| {
            pet.refill(vital, at);
            pet.clone()
        }))
    }

    async fn insert_sale(&self, sale: &SaleListing) -> Result<(), PondError> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.active_sale_for(sale.user_pet_id) {
            return Err(PondError::Conflict(format!(
                "pet {} is already listed as sale {}",
                sale.user_pet_id, existing.id
            )));
        }
        tables.sales.insert(sale.id, sale.clone());
        Ok(())
    }

    async fn get_sale(&self, id: SaleId) -> Result<Option<SaleListing>, PondError> {
        Ok(self.tables.read().await.sales.get(&id).cloned())
    }

    async fn find_active_sale(
        &self,
        pet_id: PetId,
        seller_id: UserId,
    ) -> Result<Option<SaleListing>, PondError> {
        let tables = self.tables.read().await;
        Ok(tables
            .active_sale_for(pet_id)
            .filter(|s| s.seller_id == seller_id)
            .cloned())
    }

    async fn deactivate_sale(&self, id: SaleId) -> Result<bool, PondError> {
        let mut tables = self.tables.write().await;
        Ok(match tables.sales.get_mut(&id) {
            Some(sale) if sale.is_active => {
                sale.is_active = false;
                true
            }
            _ => false,
        })
    }

    async fn list_active_sales(&self, offset: u64, limit: u64) -> Result<SalePage, PondError> {
        let tables = self.tables.read().await;
        let mut active: Vec<&SaleListing> = tables.sales.values().filter(|s| s.is_active).collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let total = active.len() as u64;
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        let listings = active.into_iter().skip(skip).take(take).cloned().collect();
        Ok(SalePage { listings, total })
    }

    async fn transfer_pet_ownership(
        &self,
        request: &TransferRequest,
    ) -> Result<TransferResponse, PondError> {
        let mut tables = self.tables.write().await;
        match tables.apply_transfer(request) {
            Ok(sale_id) => Ok(TransferResponse::committed(format!(
                "pet {} transferred under sale {sale_id}",
                request.pet_id
            ))),
            Err(reason) => Ok(TransferResponse::rejected(reason)),
        }
    }

    async fn record_ledger_entries(&self, entries: &[LedgerEntry]) -> Result<(), PondError> {
        self.tables.write().await.ledger.extend_from_slice(entries);
        Ok(())
    }

    async fn ledger_for(&self, user_id: UserId) -> Result<Vec<LedgerEntry>, PondError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<LedgerEntry> = tables
            .ledger
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}
