//! Per-pet request generations for `validate_purchase`.
//!
//! Every validation request bumps the pet's generation. A result is only
//! delivered if its generation is still the newest one for that pet, so a
//! slow answer to an old request can never overwrite a newer one.

use std::collections::HashMap;

use crate::domain::PetId;

/// Generation counters for one connection.
///
/// Generations come from one connection-wide counter, so a number is never
/// reused even after a pet's entry has been cleared.
#[derive(Debug, Default)]
pub struct RequestGenerations {
    issued: u64,
    latest: HashMap<PetId, u64>,
}

impl RequestGenerations {
    /// Creates an empty counter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new request for `pet_id` and returns its generation.
    pub fn next(&mut self, pet_id: PetId) -> u64 {
        self.issued = self.issued.saturating_add(1);
        self.latest.insert(pet_id, self.issued);
        self.issued
    }

    /// Returns `true` if `generation` is the newest request for `pet_id`.
    #[must_use]
    pub fn is_current(&self, pet_id: PetId, generation: u64) -> bool {
        self.latest.get(&pet_id) == Some(&generation)
    }

    /// Marks `generation` answered. Returns `false` for a stale result.
    pub fn complete(&mut self, pet_id: PetId, generation: u64) -> bool {
        if !self.is_current(pet_id, generation) {
            return false;
        }
        self.latest.remove(&pet_id);
        true
    }

    /// Number of pets with a request still in flight.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.latest.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_newest_generation_is_current() {
        let mut gens = RequestGenerations::new();
        let pet = PetId::new();
        let first = gens.next(pet);
        let second = gens.next(pet);
        assert!(second > first);
        assert!(!gens.is_current(pet, first));
        assert!(gens.is_current(pet, second));
    }

    #[test]
    fn completed_requests_are_forgotten() {
        let mut gens = RequestGenerations::new();
        let pet = PetId::new();
        let stale = gens.next(pet);
        let newest = gens.next(pet);

        assert!(!gens.complete(pet, stale));
        assert!(gens.complete(pet, newest));
        assert_eq!(gens.pending(), 0);
        // a late answer to the old request stays stale after the entry is gone
        assert!(!gens.complete(pet, stale));

        let again = gens.next(pet);
        assert!(again > newest);
        assert!(!gens.is_current(pet, stale));
    }

    #[test]
    fn pets_are_tracked_independently() {
        let mut gens = RequestGenerations::new();
        let a = PetId::new();
        let b = PetId::new();
        let ga = gens.next(a);
        let gb = gens.next(b);
        assert!(gens.is_current(a, ga));
        assert!(gens.is_current(b, gb));
        assert!(!gens.is_current(PetId::new(), 1));
    }
}
