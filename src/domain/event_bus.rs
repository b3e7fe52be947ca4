//! Fan-out of [`PetEvent`]s to WebSocket connections.
//!
//! Services publish after a change is committed; each connection holds its
//! own receiver and filters by the pets it watches.

use tokio::sync::broadcast;

use super::PetEvent;

/// Cloneable handle over one broadcast channel of pet events.
///
/// A receiver that falls more than `capacity` events behind loses the
/// oldest ones and sees `RecvError::Lagged` on its next read.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PetEvent>,
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` events per receiver
    /// (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes `event` and returns how many connections will see it.
    pub fn publish(&self, event: PetEvent) -> usize {
        let pet_id = event.pet_id();
        let event_type = event.event_type_str();
        match self.sender.send(event) {
            Ok(watchers) => {
                tracing::debug!(%pet_id, event_type, watchers, "pet event published");
                watchers
            }
            Err(_) => {
                tracing::trace!(%pet_id, event_type, "pet event dropped, nobody listening");
                0
            }
        }
    }

    /// Receiver for events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PetEvent> {
        self.sender.subscribe()
    }

    /// Open receivers, reported by the health endpoint.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::Utc;
    use tokio::sync::broadcast::error::RecvError;

    use super::*;
    use crate::domain::{PetId, UserId};

    fn fed(pet_id: PetId) -> PetEvent {
        PetEvent::PetFed {
            pet_id,
            fed_by: UserId::new(),
            timestamp: Utc::now(),
        }
    }

    fn transferred(pet_id: PetId, price_nd: i64) -> PetEvent {
        PetEvent::PetTransferred {
            pet_id,
            seller_id: UserId::new(),
            buyer_id: UserId::new(),
            price_nd,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn zero_capacity_still_builds_a_usable_bus() {
        let bus = EventBus::new(0);
        let _rx = bus.subscribe();
        assert_eq!(bus.publish(fed(PetId::new())), 1);
    }

    #[tokio::test]
    async fn feed_then_sale_arrive_in_publish_order() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let pet = PetId::new();

        bus.publish(fed(pet));
        bus.publish(transferred(pet, 250));

        let (Ok(first), Ok(second)) = (rx.recv().await, rx.recv().await) else {
            panic!("expected two events");
        };
        assert_eq!(first.event_type_str(), "pet_fed");
        assert_eq!(second.event_type_str(), "pet_transferred");
        assert!(matches!(second, PetEvent::PetTransferred { price_nd: 250, .. }));
    }

    #[tokio::test]
    async fn late_subscriber_misses_earlier_events() {
        let bus = EventBus::new(16);
        let early = bus.subscribe();
        bus.publish(fed(PetId::new()));

        let mut late = bus.subscribe();
        let pet = PetId::new();
        bus.publish(transferred(pet, 10));
        let Ok(event) = late.recv().await else {
            panic!("late subscriber got nothing");
        };
        assert_eq!(event.pet_id(), pet);

        drop(early);
        assert_eq!(bus.receiver_count(), 1);
    }

    #[tokio::test]
    async fn slow_watcher_lags_behind_a_burst_of_feeds() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        let pet = PetId::new();
        for _ in 0..5 {
            bus.publish(fed(pet));
        }
        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(3))));
        let Ok(event) = rx.recv().await else {
            panic!("newest events should survive");
        };
        assert_eq!(event.event_type_str(), "pet_fed");
    }
}
