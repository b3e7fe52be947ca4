//! Pet record: fixed personality, decaying vitals and ownership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{PetId, UserId};

/// Upper bound of a vital stat (hunger, water).
pub const MAX_VITAL: i32 = 100;

/// Lower bound of a vital stat.
pub const MIN_VITAL: i32 = 0;

/// Personality traits accept this magnitude in both directions so that
/// "special" pets may carry intentionally negative traits.
pub const TRAIT_LIMIT: i32 = 100;

/// A decaying stat that users can refill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Vital {
    /// Refilled by feeding.
    Hunger,
    /// Refilled by watering.
    Water,
}

impl Vital {
    /// Verb describing the refill, used in messages.
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::Hunger => "feed",
            Self::Water => "water",
        }
    }
}

/// Fixed personality attributes, set at adoption and never touched by
/// the decay engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Personality {
    /// How much the pet enjoys company.
    pub friendliness: i32,
    /// Appetite for play.
    pub playfulness: i32,
    /// Activity level.
    pub energy: i32,
    /// Attachment to its owner.
    pub loyalty: i32,
    /// Eagerness to explore.
    pub curiosity: i32,
}

impl Personality {
    /// Builds a personality, clamping every trait into
    /// `[-TRAIT_LIMIT, TRAIT_LIMIT]`.
    #[must_use]
    pub fn new(friendliness: i32, playfulness: i32, energy: i32, loyalty: i32, curiosity: i32) -> Self {
        Self {
            friendliness,
            playfulness,
            energy,
            loyalty,
            curiosity,
        }
        .clamped()
    }

    /// Returns a copy with every trait clamped into range.
    #[must_use]
    pub fn clamped(self) -> Self {
        let clamp = |v: i32| v.clamp(-TRAIT_LIMIT, TRAIT_LIMIT);
        Self {
            friendliness: clamp(self.friendliness),
            playfulness: clamp(self.playfulness),
            energy: clamp(self.energy),
            loyalty: clamp(self.loyalty),
            curiosity: clamp(self.curiosity),
        }
    }
}

impl Default for Personality {
    fn default() -> Self {
        Self::new(50, 50, 50, 50, 50)
    }
}

/// A pet as persisted.
///
/// `hunger` and `water` hold the level recorded at the last interaction;
/// the level a viewer should see right now is derived by
/// [`super::decay::calculate_current_stats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Pet {
    /// Pet identifier.
    pub id: PetId,
    /// Current owner. Reassigned wholesale on transfer.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Fixed personality traits.
    pub personality: Personality,
    /// Stored hunger level (100 = full).
    pub hunger: i32,
    /// Stored water level (100 = full).
    pub water: i32,
    /// Last feeding instant. `None` reads as "just now".
    pub last_fed: Option<DateTime<Utc>>,
    /// Last watering instant. `None` reads as "just now".
    pub last_watered: Option<DateTime<Utc>>,
    /// Adoption timestamp.
    pub created_at: DateTime<Utc>,
}

impl Pet {
    /// Creates a freshly adopted pet: full vitals, both interaction
    /// timestamps set to `now`.
    #[must_use]
    pub fn adopt(owner: UserId, name: String, personality: Personality, now: DateTime<Utc>) -> Self {
        Self {
            id: PetId::new(),
            user_id: owner,
            name,
            personality: personality.clamped(),
            hunger: MAX_VITAL,
            water: MAX_VITAL,
            last_fed: Some(now),
            last_watered: Some(now),
            created_at: now,
        }
    }

    /// Sets `vital` back to full as of `at`.
    pub fn refill(&mut self, vital: Vital, at: DateTime<Utc>) {
        match vital {
            Vital::Hunger => {
                self.hunger = MAX_VITAL;
                self.last_fed = Some(at);
            }
            Vital::Water => {
                self.water = MAX_VITAL;
                self.last_watered = Some(at);
            }
        }
    }
}
