//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::PondConfig;
use crate::domain::{Clock, EventBus};
use crate::persistence::PondStore;
use crate::service::{MarketService, PetService, ProfileService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Adoption, vitals and feed/water.
    pub pet_service: Arc<PetService>,
    /// Listings and purchases.
    pub market_service: Arc<MarketService>,
    /// Profiles and ledger history.
    pub profile_service: Arc<ProfileService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}

impl AppState {
    /// Wires every service around one store and one clock.
    #[must_use]
    pub fn new(config: &PondConfig, store: Arc<dyn PondStore>, clock: Arc<dyn Clock>) -> Self {
        let event_bus = EventBus::new(config.event_bus_capacity);
        let pet_service = Arc::new(PetService::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            config.decay_policy,
            event_bus.clone(),
        ));
        let market_service = Arc::new(MarketService::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            event_bus.clone(),
        ));
        let profile_service = Arc::new(ProfileService::new(store, clock));
        Self {
            pet_service,
            market_service,
            profile_service,
            event_bus,
        }
    }
}
