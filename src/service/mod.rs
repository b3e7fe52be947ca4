//! Service layer: business logic orchestration.
//!
//! Services own an `Arc<dyn PondStore>`, an injected [`crate::domain::Clock`]
//! and the [`crate::domain::EventBus`]. Every mutation follows the same
//! shape: load → check rules → write through the store → emit events →
//! return the result.

pub mod market_service;
pub mod pet_service;
pub mod profile_service;

pub use market_service::{MarketService, PurchaseOutcome};
pub use pet_service::PetService;
pub use profile_service::ProfileService;
