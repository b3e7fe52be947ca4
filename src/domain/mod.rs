//! Domain layer: pet records, the decay engine, purchase rules, and the
//! event system.
//!
//! Everything here is synchronous and free of I/O except the
//! [`EventBus`], which only fans events out to in-process subscribers.

pub mod clock;
pub mod decay;
pub mod event_bus;
pub mod ids;
pub mod ledger;
pub mod pet;
pub mod pet_event;
pub mod profile;
pub mod purchase;
pub mod sale;

pub use clock::{Clock, ManualClock, SystemClock};
pub use decay::DecayPolicy;
pub use event_bus::EventBus;
pub use ids::{LedgerEntryId, PetId, SaleId, UserId};
pub use ledger::{LedgerEntry, LedgerKind};
pub use pet::{Personality, Pet, Vital};
pub use pet_event::PetEvent;
pub use profile::Profile;
pub use purchase::{BlockReason, Eligibility, PurchaseAttempt, PurchaseState};
pub use sale::SaleListing;
