//! Domain events emitted after pet and marketplace mutations.
//!
//! Every committed change publishes a [`PetEvent`] through the
//! [`super::EventBus`] so that every open pet page can refresh, not just
//! the one that acted.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{PetId, SaleId, UserId};

/// Domain event emitted after every state mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum PetEvent {
    /// A new pet was adopted.
    PetAdopted {
        /// Pet identifier.
        pet_id: PetId,
        /// New owner.
        owner_id: UserId,
        /// Pet name.
        name: String,
        /// Adoption timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A pet was fed back to full hunger.
    PetFed {
        /// Pet identifier.
        pet_id: PetId,
        /// User that fed the pet.
        fed_by: UserId,
        /// Feeding timestamp (the new `last_fed`).
        timestamp: DateTime<Utc>,
    },

    /// A pet was watered back to full.
    PetWatered {
        /// Pet identifier.
        pet_id: PetId,
        /// User that watered the pet.
        watered_by: UserId,
        /// Watering timestamp (the new `last_watered`).
        timestamp: DateTime<Utc>,
    },

    /// A pet was put up for sale.
    ListingCreated {
        /// Pet identifier.
        pet_id: PetId,
        /// Listing identifier.
        sale_id: SaleId,
        /// Asking price in ND.
        price_nd: i64,
        /// Whether the listing is reserved for one buyer.
        targeted: bool,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A seller withdrew a listing.
    ListingCancelled {
        /// Pet identifier.
        pet_id: PetId,
        /// Listing identifier.
        sale_id: SaleId,
        /// Cancellation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A pet changed owner through a marketplace purchase.
    PetTransferred {
        /// Pet identifier.
        pet_id: PetId,
        /// Previous owner.
        seller_id: UserId,
        /// New owner.
        buyer_id: UserId,
        /// Price paid in ND.
        price_nd: i64,
        /// Transfer timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl PetEvent {
    /// Returns the pet this event concerns.
    #[must_use]
    pub fn pet_id(&self) -> PetId {
        match self {
            Self::PetAdopted { pet_id, .. }
            | Self::PetFed { pet_id, .. }
            | Self::PetWatered { pet_id, .. }
            | Self::ListingCreated { pet_id, .. }
            | Self::ListingCancelled { pet_id, .. }
            | Self::PetTransferred { pet_id, .. } => *pet_id,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::PetAdopted { .. } => "pet_adopted",
            Self::PetFed { .. } => "pet_fed",
            Self::PetWatered { .. } => "pet_watered",
            Self::ListingCreated { .. } => "listing_created",
            Self::ListingCancelled { .. } => "listing_cancelled",
            Self::PetTransferred { .. } => "pet_transferred",
        }
    }
}
