//! Per-connection subscription manager.
//!
//! Tracks which pet IDs a WebSocket client is subscribed to and
//! provides server-side event filtering.

use std::collections::HashSet;

use crate::domain::PetId;

/// Pet ids parsed from a subscribe/unsubscribe command.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SubscriptionTargets {
    /// Well-formed pet ids.
    pub ids: Vec<PetId>,
    /// Whether `"*"` was present.
    pub wildcard: bool,
    /// Entries that were neither `"*"` nor a UUID.
    pub rejected: Vec<String>,
}

impl SubscriptionTargets {
    /// Parses raw command entries.
    #[must_use]
    pub fn parse(raw: &[String]) -> Self {
        let mut targets = Self::default();
        for entry in raw {
            if entry == "*" {
                targets.wildcard = true;
            } else if let Ok(uuid) = entry.parse::<uuid::Uuid>() {
                targets.ids.push(PetId::from_uuid(uuid));
            } else {
                targets.rejected.push(entry.clone());
            }
        }
        targets
    }
}

/// Manages the set of pet subscriptions for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed pet IDs. If `subscribe_all` is true, this set is ignored.
    pet_ids: HashSet<PetId>,
    /// Whether the client subscribes to all pets (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds pet IDs to the subscription set. `wildcard` enables `"*"`.
    pub fn subscribe(&mut self, ids: &[PetId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.pet_ids.extend(ids.iter().copied());
    }

    /// Removes pet IDs from the subscription set. `wildcard` turns the
    /// `"*"` subscription off.
    pub fn unsubscribe(&mut self, ids: &[PetId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = false;
        }
        for id in ids {
            self.pet_ids.remove(id);
        }
    }

    /// Returns `true` if the given pet ID matches the subscription filter.
    #[must_use]
    pub fn matches(&self, pet_id: PetId) -> bool {
        self.subscribe_all || self.pet_ids.contains(&pet_id)
    }

    /// Returns the number of explicitly subscribed pet IDs.
    #[must_use]
    pub fn count(&self) -> usize {
        self.pet_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_matches_nothing() {
        let mgr = SubscriptionManager::new();
        assert!(!mgr.matches(PetId::new()));
    }

    #[test]
    fn subscribe_specific_pet() {
        let mut mgr = SubscriptionManager::new();
        let id = PetId::new();
        mgr.subscribe(&[id], false);
        assert!(mgr.matches(id));
        assert!(!mgr.matches(PetId::new()));
        assert_eq!(mgr.count(), 1);
    }

    #[test]
    fn wildcard_toggles() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[], true);
        assert!(mgr.matches(PetId::new()));
        mgr.unsubscribe(&[], true);
        assert!(!mgr.matches(PetId::new()));
    }

    #[test]
    fn unsubscribe_removes_pet() {
        let mut mgr = SubscriptionManager::new();
        let id = PetId::new();
        mgr.subscribe(&[id], false);
        mgr.unsubscribe(&[id], false);
        assert!(!mgr.matches(id));
    }

    #[test]
    fn targets_split_ids_wildcard_and_garbage() {
        let id = PetId::new();
        let targets =
            SubscriptionTargets::parse(&[id.to_string(), "*".to_string(), "nope".to_string()]);
        assert_eq!(targets.ids, vec![id]);
        assert!(targets.wildcard);
        assert_eq!(targets.rejected, vec!["nope".to_string()]);
    }
}
