//! Pet DTOs for adoption, display and the decay policy.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::decay::VitalsReport;
use crate::domain::{DecayPolicy, Personality, Pet, UserId};

/// Request body for `POST /pets`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdoptPetRequest {
    /// Adopting user.
    pub owner_id: UserId,
    /// Pet name, 1-32 characters.
    pub name: String,
    /// Personality traits. Each is clamped to `[-100, 100]`; all 50 when
    /// omitted.
    #[serde(default)]
    pub personality: Option<Personality>,
}

/// A pet as a viewer should see it right now.
#[derive(Debug, Serialize, ToSchema)]
pub struct PetVitalsResponse {
    /// Pet with decayed `hunger` and `water`.
    pub pet: Pet,
    /// Whether feeding is allowed now.
    pub can_feed: bool,
    /// Whether watering is allowed now.
    pub can_water: bool,
    /// Advisory minutes until feeding opens.
    pub minutes_until_feedable: u64,
    /// Advisory minutes until watering opens.
    pub minutes_until_waterable: u64,
}

impl From<VitalsReport> for PetVitalsResponse {
    fn from(report: VitalsReport) -> Self {
        Self {
            pet: report.pet,
            can_feed: report.can_feed,
            can_water: report.can_water,
            minutes_until_feedable: report.minutes_until_feedable,
            minutes_until_waterable: report.minutes_until_waterable,
        }
    }
}

/// Active decay constants, for clients that animate the bars locally.
#[derive(Debug, Serialize, ToSchema)]
pub struct DecayPolicyResponse {
    /// Hours for a full hunger bar to empty.
    pub hunger_depletion_hours: f64,
    /// Hours for a full water bar to empty.
    pub water_depletion_hours: f64,
    /// Minutes a refilled stat stays pinned at 100.
    pub grace_window_minutes: i64,
    /// Hunger points lost per whole hour.
    pub hunger_rate_per_hour: f64,
    /// Water points lost per whole hour.
    pub water_rate_per_hour: f64,
}

impl From<&DecayPolicy> for DecayPolicyResponse {
    fn from(policy: &DecayPolicy) -> Self {
        Self {
            hunger_depletion_hours: hours(policy.hunger_depletion()),
            water_depletion_hours: hours(policy.water_depletion()),
            grace_window_minutes: policy.grace_window().num_minutes(),
            hunger_rate_per_hour: policy.hunger_rate_per_hour(),
            water_rate_per_hour: policy.water_rate_per_hour(),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn hours(duration: chrono::Duration) -> f64 {
    duration.num_seconds() as f64 / 3600.0
}
