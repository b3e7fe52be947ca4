//! Vital-stat decay and the feed/water interaction gate.
//!
//! Hunger and water fall linearly from the level stored at the last
//! interaction. The elapsed time is counted in whole hours, so a level
//! only moves on the hour. Right after an interaction a grace window
//! pins a full stat at exactly 100, which hides timestamp skew between
//! the viewer that acted and everyone else looking at the same pet.
//!
//! Every function here is pure: the instant to evaluate at is always a
//! parameter.

use chrono::{DateTime, Duration, Utc};

use super::pet::{MAX_VITAL, MIN_VITAL, Pet};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;
const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// Errors raised when building a [`DecayPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecayPolicyError {
    /// A depletion duration was zero or negative.
    #[error("{0} depletion must be positive")]
    NonPositiveDepletion(&'static str),
    /// The grace window was negative.
    #[error("grace window must not be negative")]
    NegativeGraceWindow,
}

/// Decay constants.
///
/// Defaults: hunger empties over 16 hours, water over 12 hours, and a
/// freshly refilled stat stays pinned at 100 for 30 minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecayPolicy {
    hunger_depletion: Duration,
    water_depletion: Duration,
    grace_window: Duration,
}

impl DecayPolicy {
    /// Default time for a full hunger bar to reach zero.
    pub const DEFAULT_HUNGER_DEPLETION_HOURS: i64 = 16;
    /// Default time for a full water bar to reach zero.
    pub const DEFAULT_WATER_DEPLETION_HOURS: i64 = 12;
    /// Default grace window after an interaction.
    pub const DEFAULT_GRACE_WINDOW_MINUTES: i64 = 30;

    /// Builds a policy.
    ///
    /// # Errors
    ///
    /// Returns [`DecayPolicyError`] if a depletion duration is not
    /// positive or the grace window is negative.
    pub fn new(
        hunger_depletion: Duration,
        water_depletion: Duration,
        grace_window: Duration,
    ) -> Result<Self, DecayPolicyError> {
        if hunger_depletion <= Duration::zero() {
            return Err(DecayPolicyError::NonPositiveDepletion("hunger"));
        }
        if water_depletion <= Duration::zero() {
            return Err(DecayPolicyError::NonPositiveDepletion("water"));
        }
        if grace_window < Duration::zero() {
            return Err(DecayPolicyError::NegativeGraceWindow);
        }
        Ok(Self {
            hunger_depletion,
            water_depletion,
            grace_window,
        })
    }

    /// Time for a full hunger bar to empty.
    #[must_use]
    pub const fn hunger_depletion(&self) -> Duration {
        self.hunger_depletion
    }

    /// Time for a full water bar to empty.
    #[must_use]
    pub const fn water_depletion(&self) -> Duration {
        self.water_depletion
    }

    /// Window after an interaction during which a full stat reads 100.
    #[must_use]
    pub const fn grace_window(&self) -> Duration {
        self.grace_window
    }

    /// Hunger points lost per elapsed hour.
    #[must_use]
    pub fn hunger_rate_per_hour(&self) -> f64 {
        rate_per_hour(self.hunger_depletion)
    }

    /// Water points lost per elapsed hour.
    #[must_use]
    pub fn water_rate_per_hour(&self) -> f64 {
        rate_per_hour(self.water_depletion)
    }
}

impl Default for DecayPolicy {
    fn default() -> Self {
        Self {
            hunger_depletion: Duration::hours(Self::DEFAULT_HUNGER_DEPLETION_HOURS),
            water_depletion: Duration::hours(Self::DEFAULT_WATER_DEPLETION_HOURS),
            grace_window: Duration::minutes(Self::DEFAULT_GRACE_WINDOW_MINUTES),
        }
    }
}

/// Everything a pet page needs to render the vitals panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VitalsReport {
    /// The pet with hunger and water replaced by their current values.
    pub pet: Pet,
    /// Whether feeding is allowed right now.
    pub can_feed: bool,
    /// Whether watering is allowed right now.
    pub can_water: bool,
    /// Advisory minutes until feeding opens (0 when already open).
    pub minutes_until_feedable: u64,
    /// Advisory minutes until watering opens (0 when already open).
    pub minutes_until_waterable: u64,
}

/// Derives the hunger and water a viewer should see at `now`.
///
/// The returned pet is a copy of `pet` where only `hunger` and `water`
/// changed; personality and every other field are carried over as-is.
#[must_use]
pub fn calculate_current_stats(pet: &Pet, now: DateTime<Utc>, policy: &DecayPolicy) -> Pet {
    let hunger = decayed_level(
        pet.hunger,
        elapsed_since(pet.last_fed, now),
        policy.hunger_depletion,
        policy.grace_window,
    );
    let water = decayed_level(
        pet.water,
        elapsed_since(pet.last_watered, now),
        policy.water_depletion,
        policy.grace_window,
    );

    Pet {
        hunger,
        water,
        ..pet.clone()
    }
}

/// [`calculate_current_stats`] lifted over a possibly missing pet.
#[must_use]
pub fn calculate_current_stats_opt(
    pet: Option<&Pet>,
    now: DateTime<Utc>,
    policy: &DecayPolicy,
) -> Option<Pet> {
    pet.map(|p| calculate_current_stats(p, now, policy))
}

/// Returns `true` if the pet's current hunger is below full.
#[must_use]
pub fn can_feed(pet: &Pet, now: DateTime<Utc>, policy: &DecayPolicy) -> bool {
    calculate_current_stats(pet, now, policy).hunger < MAX_VITAL
}

/// Returns `true` if the pet's current water is below full.
#[must_use]
pub fn can_water(pet: &Pet, now: DateTime<Utc>, policy: &DecayPolicy) -> bool {
    calculate_current_stats(pet, now, policy).water < MAX_VITAL
}

/// Rough minutes until the pet can be fed again. Display hint only; the
/// gate is [`can_feed`].
#[must_use]
pub fn minutes_until_feedable(pet: &Pet, now: DateTime<Utc>, policy: &DecayPolicy) -> u64 {
    if can_feed(pet, now, policy) {
        return 0;
    }
    minutes_remaining(elapsed_since(pet.last_fed, now), policy.hunger_depletion)
}

/// Rough minutes until the pet can be watered again. Display hint only;
/// the gate is [`can_water`].
#[must_use]
pub fn minutes_until_waterable(pet: &Pet, now: DateTime<Utc>, policy: &DecayPolicy) -> u64 {
    if can_water(pet, now, policy) {
        return 0;
    }
    minutes_remaining(elapsed_since(pet.last_watered, now), policy.water_depletion)
}

/// Builds the full [`VitalsReport`] for `pet` at `now`.
#[must_use]
pub fn vitals_report(pet: &Pet, now: DateTime<Utc>, policy: &DecayPolicy) -> VitalsReport {
    VitalsReport {
        pet: calculate_current_stats(pet, now, policy),
        can_feed: can_feed(pet, now, policy),
        can_water: can_water(pet, now, policy),
        minutes_until_feedable: minutes_until_feedable(pet, now, policy),
        minutes_until_waterable: minutes_until_waterable(pet, now, policy),
    }
}

/// Time since `since`, floored at zero. A missing timestamp or one in
/// the future counts as no time at all.
fn elapsed_since(since: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Duration {
    since
        .map(|t| now.signed_duration_since(t))
        .filter(|d| *d > Duration::zero())
        .unwrap_or_else(Duration::zero)
}

fn rate_per_hour(depletion: Duration) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let hours = depletion.num_milliseconds() as f64 / MILLIS_PER_HOUR;
    f64::from(MAX_VITAL) / hours
}

fn decayed_level(stored: i32, elapsed: Duration, depletion: Duration, grace: Duration) -> i32 {
    if stored >= MAX_VITAL && elapsed < grace {
        return MAX_VITAL;
    }

    #[allow(clippy::cast_precision_loss)]
    let whole_hours = elapsed.num_hours() as f64;
    let raw = f64::from(stored) - whole_hours * rate_per_hour(depletion);
    let clamped = raw
        .round()
        .clamp(f64::from(MIN_VITAL), f64::from(MAX_VITAL));

    #[allow(clippy::cast_possible_truncation)]
    let level = clamped as i32;
    level
}

fn minutes_remaining(elapsed: Duration, depletion: Duration) -> u64 {
    #[allow(clippy::cast_precision_loss)]
    let minutes = (depletion - elapsed).num_milliseconds() as f64 / MILLIS_PER_MINUTE;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let minutes = minutes.ceil().max(0.0) as u64;
    minutes
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::pet::Personality;
    use crate::domain::{PetId, UserId};

    fn pet_at(hunger: i32, water: i32, fed: Option<DateTime<Utc>>, watered: Option<DateTime<Utc>>) -> Pet {
        Pet {
            id: PetId::new(),
            user_id: UserId::new(),
            name: "Pip".to_string(),
            personality: Personality::new(10, -40, 75, 100, -100),
            hunger,
            water,
            last_fed: fed,
            last_watered: watered,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn full_pet_fed_ten_minutes_ago_stays_full() {
        let now = Utc::now();
        let pet = pet_at(100, 100, Some(now - Duration::minutes(10)), Some(now));
        let policy = DecayPolicy::default();

        assert_eq!(calculate_current_stats(&pet, now, &policy).hunger, 100);
        assert!(!can_feed(&pet, now, &policy));
    }

    #[test]
    fn eight_hours_without_food_halves_hunger() {
        let now = Utc::now();
        let pet = pet_at(100, 100, Some(now - Duration::hours(8)), Some(now));
        let policy = DecayPolicy::default();

        assert_eq!(calculate_current_stats(&pet, now, &policy).hunger, 50);
        assert!(can_feed(&pet, now, &policy));
    }

    #[test]
    fn water_drains_faster_than_hunger() {
        let now = Utc::now();
        let six_hours_ago = Some(now - Duration::hours(6));
        let pet = pet_at(100, 100, six_hours_ago, six_hours_ago);
        let current = calculate_current_stats(&pet, now, &DecayPolicy::default());

        // 100 - 6 * 6.25 = 62.5 rounds away from zero
        assert_eq!(current.hunger, 63);
        assert_eq!(current.water, 50);
    }

    #[test]
    fn partial_hours_do_not_count() {
        let now = Utc::now();
        let pet = pet_at(80, 80, Some(now - Duration::minutes(119)), Some(now));
        let current = calculate_current_stats(&pet, now, &DecayPolicy::default());
        // one whole hour elapsed: 80 - 6.25 = 73.75
        assert_eq!(current.hunger, 74);
    }

    #[test]
    fn long_neglect_floors_at_zero() {
        let now = Utc::now();
        let long_ago = Some(now - Duration::days(30));
        let pet = pet_at(100, 100, long_ago, long_ago);
        let current = calculate_current_stats(&pet, now, &DecayPolicy::default());
        assert_eq!(current.hunger, 0);
        assert_eq!(current.water, 0);
    }

    #[test]
    fn out_of_range_stored_levels_are_clamped() {
        let now = Utc::now();
        let two_hours_ago = Some(now - Duration::hours(2));
        let policy = DecayPolicy::default();

        let high = calculate_current_stats(&pet_at(400, 250, two_hours_ago, two_hours_ago), now, &policy);
        assert_eq!(high.hunger, 100);
        assert_eq!(high.water, 100);

        let low = calculate_current_stats(&pet_at(-20, -1, None, None), now, &policy);
        assert_eq!(low.hunger, 0);
        assert_eq!(low.water, 0);
    }

    #[test]
    fn clamping_holds_across_inputs() {
        let now = Utc::now();
        let policy = DecayPolicy::default();
        let levels = [-500, -1, 0, 1, 50, 99, 100, 101, 1_000];
        let elapsed = [None, Some(0), Some(20), Some(59), Some(61), Some(600), Some(100_000)];

        for hunger in levels {
            for water in levels {
                for mins in elapsed {
                    let at = mins.map(|m| now - Duration::minutes(m));
                    let current = calculate_current_stats(&pet_at(hunger, water, at, at), now, &policy);
                    assert!((0..=100).contains(&current.hunger), "hunger {hunger} @ {mins:?}");
                    assert!((0..=100).contains(&current.water), "water {water} @ {mins:?}");
                }
            }
        }
    }

    #[test]
    fn missing_timestamps_read_as_full() {
        let now = Utc::now();
        let pet = pet_at(100, 100, None, None);
        let policy = DecayPolicy::default();

        let current = calculate_current_stats(&pet, now, &policy);
        assert_eq!(current.hunger, 100);
        assert_eq!(current.water, 100);
        assert!(!can_feed(&pet, now, &policy));
        assert!(!can_water(&pet, now, &policy));
    }

    #[test]
    fn future_timestamp_counts_as_no_elapsed_time() {
        let now = Utc::now();
        let pet = pet_at(100, 60, Some(now + Duration::hours(5)), Some(now + Duration::hours(5)));
        let current = calculate_current_stats(&pet, now, &DecayPolicy::default());
        assert_eq!(current.hunger, 100);
        assert_eq!(current.water, 60);
    }

    #[test]
    fn personality_and_identity_pass_through() {
        let now = Utc::now();
        let pet = pet_at(30, 30, Some(now - Duration::hours(9)), Some(now - Duration::hours(9)));
        let current = calculate_current_stats(&pet, now, &DecayPolicy::default());

        assert_eq!(current.personality, pet.personality);
        assert_eq!(current.id, pet.id);
        assert_eq!(current.user_id, pet.user_id);
        assert_eq!(current.name, pet.name);
        assert_eq!(current.last_fed, pet.last_fed);
        assert_eq!(current.last_watered, pet.last_watered);
    }

    #[test]
    fn grace_window_requires_full_stored_level() {
        let now = Utc::now();
        let policy = DecayPolicy::default();
        let fed = Some(now - Duration::minutes(5));

        assert_eq!(calculate_current_stats(&pet_at(100, 100, fed, fed), now, &policy).hunger, 100);
        assert_eq!(calculate_current_stats(&pet_at(99, 99, fed, fed), now, &policy).hunger, 99);
    }

    #[test]
    fn grace_window_overrides_decay_formula() {
        let now = Utc::now();
        // With a two hour window, one whole elapsed hour would already show
        // a depleted bar without the override.
        let Ok(policy) = DecayPolicy::new(Duration::hours(16), Duration::hours(12), Duration::hours(2)) else {
            panic!("valid policy");
        };
        let fed = Some(now - Duration::minutes(90));
        let current = calculate_current_stats(&pet_at(100, 100, fed, fed), now, &policy);
        assert_eq!(current.hunger, 100);
        assert_eq!(current.water, 100);
    }

    #[test]
    fn decay_is_monotonic_outside_grace_window() {
        let start = Utc::now();
        let policy = DecayPolicy::default();
        let pet = pet_at(100, 100, Some(start), Some(start));

        let mut previous = (i32::MAX, i32::MAX);
        for minutes in (31..=24 * 60).step_by(17) {
            let current = calculate_current_stats(&pet, start + Duration::minutes(minutes), &policy);
            assert!(current.hunger <= previous.0);
            assert!(current.water <= previous.1);
            previous = (current.hunger, current.water);
        }
    }

    #[test]
    fn gate_matches_calculator() {
        let now = Utc::now();
        let policy = DecayPolicy::default();
        for hunger in [0, 50, 99, 100, 140] {
            for mins in [0, 10, 45, 90, 600] {
                let at = Some(now - Duration::minutes(mins));
                let pet = pet_at(hunger, hunger, at, at);
                let current = calculate_current_stats(&pet, now, &policy);
                assert_eq!(can_feed(&pet, now, &policy), current.hunger < 100);
                assert_eq!(can_water(&pet, now, &policy), current.water < 100);
            }
        }
    }

    #[test]
    fn minutes_until_feedable_counts_down_to_full_depletion() {
        let now = Utc::now();
        let policy = DecayPolicy::default();
        let pet = pet_at(100, 100, Some(now - Duration::minutes(10)), Some(now - Duration::minutes(10)));

        assert_eq!(minutes_until_feedable(&pet, now, &policy), 16 * 60 - 10);
        assert_eq!(minutes_until_waterable(&pet, now, &policy), 12 * 60 - 10);
    }

    #[test]
    fn minutes_until_feedable_is_zero_when_gate_open() {
        let now = Utc::now();
        let policy = DecayPolicy::default();
        let pet = pet_at(40, 40, Some(now - Duration::hours(1)), Some(now - Duration::hours(1)));

        assert_eq!(minutes_until_feedable(&pet, now, &policy), 0);
        assert_eq!(minutes_until_waterable(&pet, now, &policy), 0);
    }

    #[test]
    fn vitals_report_agrees_with_parts() {
        let now = Utc::now();
        let policy = DecayPolicy::default();
        let pet = pet_at(100, 100, Some(now - Duration::hours(8)), Some(now - Duration::minutes(3)));

        let report = vitals_report(&pet, now, &policy);
        assert_eq!(report.pet.hunger, 50);
        assert_eq!(report.pet.water, 100);
        assert!(report.can_feed);
        assert!(!report.can_water);
        assert_eq!(report.minutes_until_feedable, 0);
        assert_eq!(report.minutes_until_waterable, 12 * 60 - 3);
    }

    #[test]
    fn missing_pet_passes_through() {
        let policy = DecayPolicy::default();
        assert!(calculate_current_stats_opt(None, Utc::now(), &policy).is_none());
    }

    #[test]
    fn policy_rejects_non_positive_durations() {
        assert_eq!(
            DecayPolicy::new(Duration::zero(), Duration::hours(1), Duration::zero()),
            Err(DecayPolicyError::NonPositiveDepletion("hunger"))
        );
        assert_eq!(
            DecayPolicy::new(Duration::hours(1), Duration::hours(-1), Duration::zero()),
            Err(DecayPolicyError::NonPositiveDepletion("water"))
        );
        assert_eq!(
            DecayPolicy::new(Duration::hours(1), Duration::hours(1), Duration::minutes(-1)),
            Err(DecayPolicyError::NegativeGraceWindow)
        );
    }

    #[test]
    fn default_rates() {
        let policy = DecayPolicy::default();
        assert!((policy.hunger_rate_per_hour() - 6.25).abs() < f64::EPSILON);
        assert!((policy.water_rate_per_hour() - 100.0 / 12.0).abs() < 1e-9);
    }
}
