//! Marketplace service: listings and the purchase flow.
//!
//! A purchase is driven through [`PurchaseAttempt`]: validate, transfer
//! atomically in the store, then write the ledger on a best-effort basis.
//! A failed transfer always triggers a fresh validation so the caller can
//! show the buyer why the listing is no longer buyable.

use std::sync::Arc;

use crate::domain::ledger::purchase_entries;
use crate::domain::purchase::{PurchaseContext, TransferRequest, evaluate_purchase};
use crate::domain::{
    BlockReason, Clock, Eligibility, EventBus, Pet, PetEvent, PetId, Profile, PurchaseAttempt,
    PurchaseState, SaleId, SaleListing, UserId,
};
use crate::error::PondError;
use crate::persistence::{PondStore, SalePage};

/// Shown to the buyer when the transfer could not reach the store.
pub const TRANSIENT_PURCHASE_ERROR: &str = "purchase failed, please try again";

/// Final state of one purchase attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseOutcome {
    /// Terminal state reached: `Blocked`, `Succeeded` or `Failed`.
    pub state: PurchaseState,
    /// Listing that was bought or attempted, when validation passed.
    pub sale: Option<SaleListing>,
    /// Fresh validation run after a failed transfer.
    pub revalidated: Option<Eligibility>,
}

impl PurchaseOutcome {
    /// Returns `true` if ownership changed hands.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.state == PurchaseState::Succeeded
    }

    /// Returns the reason the buyer is blocked now, if any.
    ///
    /// For a failed transfer this is the reason found by re-validation.
    #[must_use]
    pub fn block_reason(&self) -> Option<&BlockReason> {
        match &self.state {
            PurchaseState::Blocked { reason } => Some(reason),
            _ => self.revalidated.as_ref().and_then(Eligibility::block_reason),
        }
    }
}

struct LoadedContext {
    sale: Option<SaleListing>,
    pet: Option<Pet>,
    buyer: Option<Profile>,
}

impl LoadedContext {
    fn evaluate(&self, buyer_id: UserId) -> Eligibility {
        evaluate_purchase(&PurchaseContext {
            sale: self.sale.as_ref(),
            pet: self.pet.as_ref(),
            buyer_id,
            buyer: self.buyer.as_ref(),
        })
    }
}

/// Marketplace operations.
#[derive(Debug, Clone)]
pub struct MarketService {
    store: Arc<dyn PondStore>,
    clock: Arc<dyn Clock>,
    event_bus: EventBus,
}

impl MarketService {
    /// Creates a new `MarketService`.
    #[must_use]
    pub fn new(store: Arc<dyn PondStore>, clock: Arc<dyn Clock>, event_bus: EventBus) -> Self {
        Self {
            store,
            clock,
            event_bus,
        }
    }

    /// Puts a pet up for sale, optionally reserved for one username.
    ///
    /// # Errors
    ///
    /// [`PondError::InvalidRequest`] for a non-positive price,
    /// [`PondError::PetNotFound`], [`PondError::NotOwner`] if `seller` does
    /// not own the pet, [`PondError::Conflict`] if it is already listed.
    pub async fn list_pet_for_sale(
        &self,
        seller: UserId,
        pet_id: PetId,
        price_nd: i64,
        target_username: Option<String>,
    ) -> Result<SaleListing, PondError> {
        if price_nd <= 0 {
            return Err(PondError::InvalidRequest(
                "price must be a positive amount of ND".to_string(),
            ));
        }

        let pet = self
            .store
            .get_pet(pet_id)
            .await?
            .ok_or(PondError::PetNotFound(pet_id))?;
        if pet.user_id != seller {
            return Err(PondError::NotOwner(format!("{} belongs to another user", pet.name)));
        }

        let now = self.clock.now();
        let sale = SaleListing::new(pet_id, seller, price_nd, target_username, now);
        self.store.insert_sale(&sale).await?;

        let _ = self.event_bus.publish(PetEvent::ListingCreated {
            pet_id,
            sale_id: sale.id,
            price_nd,
            targeted: sale.target_username.is_some(),
            timestamp: now,
        });

        tracing::info!(%pet_id, sale_id = %sale.id, price_nd, "listing created");
        Ok(sale)
    }

    /// Withdraws an active listing.
    ///
    /// # Errors
    ///
    /// [`PondError::SaleNotFound`], [`PondError::NotOwner`] if `seller`
    /// did not create it, [`PondError::Conflict`] if it is already inactive.
    pub async fn cancel_listing(
        &self,
        seller: UserId,
        sale_id: SaleId,
    ) -> Result<SaleListing, PondError> {
        let mut sale = self
            .store
            .get_sale(sale_id)
            .await?
            .ok_or(PondError::SaleNotFound(sale_id))?;
        if sale.seller_id != seller {
            return Err(PondError::NotOwner("only the seller may cancel a listing".to_string()));
        }
        if !sale.is_active || !self.store.deactivate_sale(sale_id).await? {
            return Err(PondError::Conflict("listing is no longer active".to_string()));
        }
        sale.is_active = false;

        let _ = self.event_bus.publish(PetEvent::ListingCancelled {
            pet_id: sale.user_pet_id,
            sale_id,
            timestamp: self.clock.now(),
        });

        tracing::info!(pet_id = %sale.user_pet_id, %sale_id, "listing cancelled");
        Ok(sale)
    }

    /// Returns one page of active listings, newest first.
    ///
    /// # Errors
    ///
    /// [`PondError::PersistenceError`] on storage failure.
    pub async fn active_listings(&self, offset: u64, limit: u64) -> Result<SalePage, PondError> {
        self.store.list_active_sales(offset, limit).await
    }

    /// Runs the purchase rules without buying anything.
    ///
    /// # Errors
    ///
    /// [`PondError::PersistenceError`] if the records could not be loaded.
    pub async fn check_eligibility(
        &self,
        pet_id: PetId,
        seller_id: UserId,
        buyer_id: UserId,
    ) -> Result<Eligibility, PondError> {
        let context = self.load_context(pet_id, seller_id, buyer_id).await?;
        Ok(context.evaluate(buyer_id))
    }

    /// Runs a complete purchase attempt.
    ///
    /// Rule violations and failed transfers are reported through the
    /// returned [`PurchaseOutcome`], not as errors.
    ///
    /// # Errors
    ///
    /// [`PondError::PersistenceError`] if the initial validation could not
    /// load its records.
    pub async fn purchase(
        &self,
        pet_id: PetId,
        seller_id: UserId,
        buyer_id: UserId,
    ) -> Result<PurchaseOutcome, PondError> {
        let mut attempt = PurchaseAttempt::new();

        attempt.begin_validation()?;
        let context = self.load_context(pet_id, seller_id, buyer_id).await?;
        let eligibility = context.evaluate(buyer_id);
        attempt.finish_validation(&eligibility)?;

        let sale = match eligibility {
            Eligibility::Eligible(sale) => sale,
            Eligibility::Blocked(reason) => {
                tracing::info!(%pet_id, buyer_id = %buyer_id, %reason, "purchase blocked");
                return Ok(PurchaseOutcome {
                    state: attempt.into_state(),
                    sale: None,
                    revalidated: None,
                });
            }
        };

        attempt.begin_transfer()?;
        let request = TransferRequest {
            pet_id,
            seller_id,
            buyer_id,
            sale_price: sale.price_nd,
        };
        let failure = match self.store.transfer_pet_ownership(&request).await {
            Ok(response) if response.success => None,
            Ok(response) => Some(
                response
                    .error
                    .unwrap_or_else(|| TRANSIENT_PURCHASE_ERROR.to_string()),
            ),
            Err(err) => {
                tracing::warn!(%pet_id, error = %err, "ownership transfer did not complete");
                Some(TRANSIENT_PURCHASE_ERROR.to_string())
            }
        };

        if let Some(error) = failure {
            tracing::info!(%pet_id, buyer_id = %buyer_id, error = %error, "purchase failed");
            attempt.fail(error)?;
            let revalidated = match self.check_eligibility(pet_id, seller_id, buyer_id).await {
                Ok(eligibility) => Some(eligibility),
                Err(err) => {
                    tracing::warn!(%pet_id, error = %err, "re-validation failed");
                    None
                }
            };
            return Ok(PurchaseOutcome {
                state: attempt.into_state(),
                sale: Some(sale),
                revalidated,
            });
        }

        attempt.succeed()?;
        let now = self.clock.now();
        self.record_ledger(&sale, &context, buyer_id).await;

        let _ = self.event_bus.publish(PetEvent::PetTransferred {
            pet_id,
            seller_id,
            buyer_id,
            price_nd: sale.price_nd,
            timestamp: now,
        });

        tracing::info!(%pet_id, %seller_id, buyer_id = %buyer_id, price_nd = sale.price_nd, "pet purchased");
        Ok(PurchaseOutcome {
            state: attempt.into_state(),
            sale: Some(sale),
            revalidated: None,
        })
    }

    async fn load_context(
        &self,
        pet_id: PetId,
        seller_id: UserId,
        buyer_id: UserId,
    ) -> Result<LoadedContext, PondError> {
        let (sale, pet, buyer) = tokio::try_join!(
            self.store.find_active_sale(pet_id, seller_id),
            self.store.get_pet(pet_id),
            self.store.get_profile(buyer_id),
        )?;
        Ok(LoadedContext { sale, pet, buyer })
    }

    /// Writes the buyer debit and seller credit. Failures are logged and
    /// never undo the committed transfer.
    async fn record_ledger(&self, sale: &SaleListing, context: &LoadedContext, buyer_id: UserId) {
        let seller_name = match self.store.get_profile(sale.seller_id).await {
            Ok(Some(seller)) => seller.username,
            Ok(None) => sale.seller_id.to_string(),
            Err(err) => {
                tracing::warn!(sale_id = %sale.id, error = %err, "seller lookup failed, ledger uses seller id");
                sale.seller_id.to_string()
            }
        };
        let buyer_name = context
            .buyer
            .as_ref()
            .map_or_else(|| buyer_id.to_string(), |b| b.username.clone());
        let pet_name = context
            .pet
            .as_ref()
            .map_or_else(|| sale.user_pet_id.to_string(), |p| p.name.clone());

        let entries = purchase_entries(
            sale.user_pet_id,
            &pet_name,
            (buyer_id, &buyer_name),
            (sale.seller_id, &seller_name),
            sale.price_nd,
            self.clock.now(),
        );
        if let Err(err) = self.store.record_ledger_entries(&entries).await {
            tracing::error!(sale_id = %sale.id, error = %err, "ledger write failed after transfer");
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::OnceLock;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::domain::purchase::TransferResponse;
    use crate::domain::{LedgerEntry, Personality, SystemClock, Vital};
    use crate::persistence::InMemoryStore;
    use crate::persistence::rejection;

    /// Wraps an [`InMemoryStore`] and fails selected calls.
    #[derive(Debug, Default)]
    struct FaultyStore {
        inner: InMemoryStore,
        fail_transfer: bool,
        fail_ledger: bool,
        /// Deactivates the listing right before the transfer runs.
        lose_race: bool,
        failing_profile: OnceLock<UserId>,
    }

    #[async_trait]
    impl PondStore for FaultyStore {
        async fn insert_profile(&self, profile: &Profile) -> Result<(), PondError> {
            self.inner.insert_profile(profile).await
        }
        async fn get_profile(&self, id: UserId) -> Result<Option<Profile>, PondError> {
            if self.failing_profile.get() == Some(&id) {
                return Err(PondError::PersistenceError("profile read timed out".to_string()));
            }
            self.inner.get_profile(id).await
        }
        async fn insert_pet(&self, pet: &Pet) -> Result<(), PondError> {
            self.inner.insert_pet(pet).await
        }
        async fn get_pet(&self, id: PetId) -> Result<Option<Pet>, PondError> {
            self.inner.get_pet(id).await
        }
        async fn refill_vital(
            &self,
            id: PetId,
            vital: Vital,
            at: DateTime<Utc>,
        ) -> Result<Option<Pet>, PondError> {
            self.inner.refill_vital(id, vital, at).await
        }
        async fn insert_sale(&self, sale: &SaleListing) -> Result<(), PondError> {
            self.inner.insert_sale(sale).await
        }
        async fn get_sale(&self, id: SaleId) -> Result<Option<SaleListing>, PondError> {
            self.inner.get_sale(id).await
        }
        async fn find_active_sale(
            &self,
            pet_id: PetId,
            seller_id: UserId,
        ) -> Result<Option<SaleListing>, PondError> {
            self.inner.find_active_sale(pet_id, seller_id).await
        }
        async fn deactivate_sale(&self, id: SaleId) -> Result<bool, PondError> {
            self.inner.deactivate_sale(id).await
        }
        async fn list_active_sales(&self, offset: u64, limit: u64) -> Result<SalePage, PondError> {
            self.inner.list_active_sales(offset, limit).await
        }
        async fn transfer_pet_ownership(
            &self,
            request: &TransferRequest,
        ) -> Result<TransferResponse, PondError> {
            if self.fail_transfer {
                return Err(PondError::PersistenceError("connection reset".to_string()));
            }
            if self.lose_race
                && let Some(sale) = self
                    .inner
                    .find_active_sale(request.pet_id, request.seller_id)
                    .await?
            {
                self.inner.deactivate_sale(sale.id).await?;
            }
            self.inner.transfer_pet_ownership(request).await
        }
        async fn record_ledger_entries(&self, entries: &[LedgerEntry]) -> Result<(), PondError> {
            if self.fail_ledger {
                return Err(PondError::PersistenceError("ledger unavailable".to_string()));
            }
            self.inner.record_ledger_entries(entries).await
        }
        async fn ledger_for(&self, user_id: UserId) -> Result<Vec<LedgerEntry>, PondError> {
            self.inner.ledger_for(user_id).await
        }
    }

    struct Market {
        service: MarketService,
        store: Arc<dyn PondStore>,
        bus: EventBus,
        seller: Profile,
        pet: Pet,
    }

    async fn market(store: Arc<dyn PondStore>) -> Market {
        let now = Utc::now();
        let seller = Profile::new("seller".to_string(), 0, now);
        let pet = Pet::adopt(seller.id, "Pebble".to_string(), Personality::default(), now);
        let Ok(()) = store.insert_profile(&seller).await else {
            panic!("seller insert");
        };
        let Ok(()) = store.insert_pet(&pet).await else {
            panic!("pet insert");
        };
        let bus = EventBus::new(64);
        let service = MarketService::new(Arc::clone(&store), Arc::new(SystemClock), bus.clone());
        Market {
            service,
            store,
            bus,
            seller,
            pet,
        }
    }

    async fn buyer(m: &Market, name: &str, balance: i64) -> Profile {
        let profile = Profile::new(name.to_string(), balance, Utc::now());
        let Ok(()) = m.store.insert_profile(&profile).await else {
            panic!("buyer insert");
        };
        profile
    }

    async fn list(m: &Market, price: i64, target: Option<&str>) -> SaleListing {
        let Ok(sale) = m
            .service
            .list_pet_for_sale(m.seller.id, m.pet.id, price, target.map(str::to_string))
            .await
        else {
            panic!("listing failed");
        };
        sale
    }

    async fn balance(m: &Market, id: UserId) -> i64 {
        let Ok(Some(profile)) = m.store.get_profile(id).await else {
            panic!("profile missing");
        };
        profile.balance
    }

    #[tokio::test]
    async fn listing_requires_owner_and_positive_price() {
        let m = market(Arc::new(InMemoryStore::new())).await;
        let stranger = buyer(&m, "stranger", 0).await;

        assert!(matches!(
            m.service.list_pet_for_sale(m.seller.id, m.pet.id, 0, None).await,
            Err(PondError::InvalidRequest(_))
        ));
        assert!(matches!(
            m.service.list_pet_for_sale(stranger.id, m.pet.id, 10, None).await,
            Err(PondError::NotOwner(_))
        ));
        assert!(matches!(
            m.service.list_pet_for_sale(m.seller.id, PetId::new(), 10, None).await,
            Err(PondError::PetNotFound(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_listing_conflicts() {
        let m = market(Arc::new(InMemoryStore::new())).await;
        list(&m, 50, None).await;
        assert!(matches!(
            m.service.list_pet_for_sale(m.seller.id, m.pet.id, 60, None).await,
            Err(PondError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn cancel_listing_rules() {
        let m = market(Arc::new(InMemoryStore::new())).await;
        let other = buyer(&m, "other", 0).await;
        let sale = list(&m, 50, None).await;

        assert!(matches!(
            m.service.cancel_listing(other.id, sale.id).await,
            Err(PondError::NotOwner(_))
        ));
        let Ok(cancelled) = m.service.cancel_listing(m.seller.id, sale.id).await else {
            panic!("cancel failed");
        };
        assert!(!cancelled.is_active);
        assert!(matches!(
            m.service.cancel_listing(m.seller.id, sale.id).await,
            Err(PondError::Conflict(_))
        ));
        assert!(matches!(
            m.service.cancel_listing(m.seller.id, SaleId::new()).await,
            Err(PondError::SaleNotFound(_))
        ));
    }

    #[tokio::test]
    async fn successful_purchase_moves_pet_funds_and_writes_ledger() {
        let m = market(Arc::new(InMemoryStore::new())).await;
        let alice = buyer(&m, "alice", 500).await;
        let sale = list(&m, 300, None).await;
        let mut rx = m.bus.subscribe();

        let Ok(outcome) = m.service.purchase(m.pet.id, m.seller.id, alice.id).await else {
            panic!("purchase errored");
        };
        assert!(outcome.succeeded());
        assert_eq!(outcome.sale.as_ref().map(|s| s.id), Some(sale.id));

        let Ok(Some(pet)) = m.store.get_pet(m.pet.id).await else {
            panic!("pet missing");
        };
        assert_eq!(pet.user_id, alice.id);
        assert_eq!(balance(&m, alice.id).await, 200);
        assert_eq!(balance(&m, m.seller.id).await, 300);

        let Ok(ledger) = m.store.ledger_for(alice.id).await else {
            panic!("ledger failed");
        };
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.first().map(|e| e.amount), Some(-300));
        assert_eq!(
            ledger.first().map(|e| e.description.as_str()),
            Some("Purchased Pebble from seller")
        );

        let Ok(event) = rx.recv().await else {
            panic!("expected event");
        };
        assert_eq!(event.event_type_str(), "pet_transferred");
    }

    #[tokio::test]
    async fn insufficient_funds_blocks_with_amounts() {
        let m = market(Arc::new(InMemoryStore::new())).await;
        let bob = buyer(&m, "bob", 100).await;
        list(&m, 300, None).await;

        let Ok(outcome) = m.service.purchase(m.pet.id, m.seller.id, bob.id).await else {
            panic!("purchase errored");
        };
        let Some(reason) = outcome.block_reason() else {
            panic!("expected a block reason");
        };
        assert_eq!(
            *reason,
            BlockReason::InsufficientFunds {
                balance: 100,
                price: 300
            }
        );
        assert!(reason.to_string().contains("short 200 ND"));
        assert_eq!(balance(&m, bob.id).await, 100);
    }

    #[tokio::test]
    async fn targeted_listing_admits_only_its_buyer() {
        let m = market(Arc::new(InMemoryStore::new())).await;
        let alice = buyer(&m, "Alice", 500).await;
        let bob = buyer(&m, "bob", 500).await;
        list(&m, 100, Some("alice")).await;

        let Ok(blocked) = m
            .service
            .check_eligibility(m.pet.id, m.seller.id, bob.id)
            .await
        else {
            panic!("eligibility errored");
        };
        assert!(matches!(
            blocked.block_reason(),
            Some(BlockReason::ReservedFor { .. })
        ));

        let Ok(allowed) = m
            .service
            .check_eligibility(m.pet.id, m.seller.id, alice.id)
            .await
        else {
            panic!("eligibility errored");
        };
        assert!(allowed.is_eligible());
    }

    #[tokio::test]
    async fn seller_cannot_buy_own_pet() {
        let m = market(Arc::new(InMemoryStore::new())).await;
        list(&m, 100, None).await;
        let Ok(outcome) = m.service.purchase(m.pet.id, m.seller.id, m.seller.id).await else {
            panic!("purchase errored");
        };
        assert_eq!(outcome.block_reason(), Some(&BlockReason::SelfPurchase));
    }

    #[tokio::test]
    async fn transient_transfer_failure_reports_generic_error_and_revalidates() {
        let store = Arc::new(FaultyStore {
            fail_transfer: true,
            ..FaultyStore::default()
        });
        let m = market(store).await;
        let alice = buyer(&m, "alice", 500).await;
        list(&m, 100, None).await;

        let Ok(outcome) = m.service.purchase(m.pet.id, m.seller.id, alice.id).await else {
            panic!("purchase errored");
        };
        assert_eq!(
            outcome.state,
            PurchaseState::Failed {
                error: TRANSIENT_PURCHASE_ERROR.to_string()
            }
        );
        let Some(revalidated) = &outcome.revalidated else {
            panic!("expected re-validation");
        };
        assert!(revalidated.is_eligible());
        assert_eq!(balance(&m, alice.id).await, 500);
    }

    #[tokio::test]
    async fn rejected_transfer_surfaces_store_error_and_revalidates() {
        let store = Arc::new(FaultyStore {
            lose_race: true,
            ..FaultyStore::default()
        });
        let m = market(store).await;
        let alice = buyer(&m, "alice", 500).await;
        list(&m, 100, None).await;

        let Ok(outcome) = m.service.purchase(m.pet.id, m.seller.id, alice.id).await else {
            panic!("purchase errored");
        };
        assert_eq!(
            outcome.state,
            PurchaseState::Failed {
                error: rejection::SALE_INACTIVE.to_string()
            }
        );
        assert_eq!(
            outcome.revalidated,
            Some(Eligibility::Blocked(BlockReason::SaleInactive))
        );
        assert_eq!(balance(&m, alice.id).await, 500);
        let Ok(Some(pet)) = m.store.get_pet(m.pet.id).await else {
            panic!("pet missing");
        };
        assert_eq!(pet.user_id, m.seller.id);
    }

    #[tokio::test]
    async fn seller_lookup_failure_still_writes_both_ledger_rows() {
        let store = Arc::new(FaultyStore::default());
        let handle: Arc<FaultyStore> = Arc::clone(&store);
        let m = market(handle).await;
        let alice = buyer(&m, "alice", 500).await;
        list(&m, 100, None).await;
        let Ok(()) = store.failing_profile.set(m.seller.id) else {
            panic!("failing profile already set");
        };

        let Ok(outcome) = m.service.purchase(m.pet.id, m.seller.id, alice.id).await else {
            panic!("purchase errored");
        };
        assert!(outcome.succeeded());

        let Ok(bought) = m.store.ledger_for(alice.id).await else {
            panic!("buyer ledger failed");
        };
        assert_eq!(bought.len(), 1);
        assert_eq!(
            bought.first().map(|e| e.description.clone()),
            Some(format!("Purchased Pebble from {}", m.seller.id))
        );
        let Ok(sold) = m.store.ledger_for(m.seller.id).await else {
            panic!("seller ledger failed");
        };
        assert_eq!(sold.first().map(|e| e.amount), Some(100));
    }

    #[tokio::test]
    async fn ledger_failure_keeps_transfer_committed() {
        let store = Arc::new(FaultyStore {
            fail_ledger: true,
            ..FaultyStore::default()
        });
        let m = market(store).await;
        let alice = buyer(&m, "alice", 500).await;
        list(&m, 100, None).await;

        let Ok(outcome) = m.service.purchase(m.pet.id, m.seller.id, alice.id).await else {
            panic!("purchase errored");
        };
        assert!(outcome.succeeded());
        assert_eq!(balance(&m, alice.id).await, 400);
        let Ok(ledger) = m.store.ledger_for(alice.id).await else {
            panic!("ledger failed");
        };
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn concurrent_buyers_only_one_wins() {
        let m = market(Arc::new(InMemoryStore::new())).await;
        let alice = buyer(&m, "alice", 500).await;
        let bob = buyer(&m, "bob", 500).await;
        list(&m, 200, None).await;

        let (a, b) = tokio::join!(
            m.service.purchase(m.pet.id, m.seller.id, alice.id),
            m.service.purchase(m.pet.id, m.seller.id, bob.id),
        );
        let (Ok(a), Ok(b)) = (a, b) else {
            panic!("purchase errored");
        };
        assert_eq!(
            usize::from(a.succeeded()) + usize::from(b.succeeded()),
            1,
            "exactly one purchase must commit"
        );

        let loser = if a.succeeded() { &b } else { &a };
        assert_eq!(loser.block_reason(), Some(&BlockReason::SaleInactive));
        assert_eq!(balance(&m, m.seller.id).await, 200);
        assert_eq!(
            balance(&m, alice.id).await + balance(&m, bob.id).await,
            800
        );
    }

    #[tokio::test]
    async fn active_listings_pages() {
        let m = market(Arc::new(InMemoryStore::new())).await;
        list(&m, 75, None).await;
        let Ok(page) = m.service.active_listings(0, 10).await else {
            panic!("listing page failed");
        };
        assert_eq!(page.total, 1);
        assert_eq!(page.listings.len(), 1);
    }
}
