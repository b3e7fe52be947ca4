//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands, forwarding filtered events and
//! delivering purchase validation results.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};

use super::generation::RequestGenerations;
use super::messages::{WsCommand, WsMessage};
use super::subscription::{SubscriptionManager, SubscriptionTargets};
use crate::api::dto::EligibilityResponse;
use crate::domain::{Eligibility, PetEvent, PetId, UserId};
use crate::error::PondError;
use crate::service::MarketService;

/// A finished `validate_purchase` request, tagged with its generation.
#[derive(Debug)]
pub struct ValidationResult {
    request_id: String,
    pet_id: PetId,
    generation: u64,
    outcome: Result<Eligibility, PondError>,
}

/// Per-connection command state.
#[derive(Debug)]
pub struct Session {
    subs: SubscriptionManager,
    generations: RequestGenerations,
    market_service: Arc<MarketService>,
    results_tx: mpsc::UnboundedSender<ValidationResult>,
}

impl Session {
    /// Creates a session whose validation results are sent to `results_tx`.
    #[must_use]
    pub fn new(
        market_service: Arc<MarketService>,
        results_tx: mpsc::UnboundedSender<ValidationResult>,
    ) -> Self {
        Self {
            subs: SubscriptionManager::new(),
            generations: RequestGenerations::new(),
            market_service,
            results_tx,
        }
    }

    /// Handles a text frame, returning the immediate reply if any.
    ///
    /// `validate_purchase` replies later, through [`Self::deliver`].
    pub fn handle_text(&mut self, text: &str) -> Option<WsMessage> {
        let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
            return Some(WsMessage::error(String::new(), 400, "malformed JSON"));
        };
        let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
            return Some(WsMessage::error(msg.id, 404, "unknown command"));
        };

        match command {
            WsCommand::Subscribe { pet_ids } => {
                let targets = SubscriptionTargets::parse(&pet_ids);
                self.subs.subscribe(&targets.ids, targets.wildcard);
                Some(WsMessage::response(
                    msg.id,
                    serde_json::json!({
                        "subscribed": targets.ids,
                        "rejected": targets.rejected,
                        "count": self.subs.count(),
                        "wildcard": self.subs.is_subscribed_all(),
                    }),
                ))
            }
            WsCommand::Unsubscribe { pet_ids } => {
                let targets = SubscriptionTargets::parse(&pet_ids);
                self.subs.unsubscribe(&targets.ids, targets.wildcard);
                Some(WsMessage::response(
                    msg.id,
                    serde_json::json!({
                        "unsubscribed": targets.ids,
                        "remaining_count": self.subs.count(),
                        "wildcard": self.subs.is_subscribed_all(),
                    }),
                ))
            }
            WsCommand::ValidatePurchase {
                pet_id,
                seller_id,
                buyer_id,
            } => {
                self.spawn_validation(msg.id, pet_id, seller_id, buyer_id);
                None
            }
        }
    }

    /// Turns a finished validation into a reply, or `None` if a newer
    /// request for the same pet has been issued since.
    #[must_use]
    pub fn deliver(&mut self, result: ValidationResult) -> Option<WsMessage> {
        if !self.generations.complete(result.pet_id, result.generation) {
            tracing::debug!(
                pet_id = %result.pet_id,
                generation = result.generation,
                "dropping stale validation result"
            );
            return None;
        }
        Some(match result.outcome {
            Ok(eligibility) => WsMessage::response(
                result.request_id,
                serde_json::json!({
                    "pet_id": result.pet_id,
                    "generation": result.generation,
                    "eligibility": EligibilityResponse::from(eligibility),
                }),
            ),
            Err(err) => WsMessage::error(result.request_id, err.error_code(), &err.to_string()),
        })
    }

    /// Returns `true` if events about `pet_id` should be forwarded.
    #[must_use]
    pub fn wants(&self, pet_id: PetId) -> bool {
        self.subs.matches(pet_id)
    }

    fn spawn_validation(
        &mut self,
        request_id: String,
        pet_id: PetId,
        seller_id: UserId,
        buyer_id: UserId,
    ) {
        let generation = self.generations.next(pet_id);
        let market_service = Arc::clone(&self.market_service);
        let results_tx = self.results_tx.clone();
        tokio::spawn(async move {
            let outcome = market_service
                .check_eligibility(pet_id, seller_id, buyer_id)
                .await;
            let _ = results_tx.send(ValidationResult {
                request_id,
                pet_id,
                generation,
                outcome,
            });
        });
    }
}

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards matching events from the [`broadcast::Receiver`] to the client.
/// - Delivers validation results that are still current.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<PetEvent>,
    market_service: Arc<MarketService>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (results_tx, mut results_rx) = mpsc::unbounded_channel();
    let mut session = Session::new(market_service, results_tx);

    loop {
        let outgoing = tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => session.handle_text(&text),
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => None,
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(pet_event) if session.wants(pet_event.pet_id()) => Some(WsMessage::event(
                        serde_json::to_value(&pet_event).unwrap_or_default(),
                    )),
                    Ok(_) => None,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                        None
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            Some(result) = results_rx.recv() => session.deliver(result),
        };

        if let Some(json) = outgoing.as_ref().and_then(WsMessage::to_json)
            && ws_tx.send(Message::text(json)).await.is_err()
        {
            break;
        }
    }

    tracing::debug!("ws connection closed");
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::{EventBus, Personality, Pet, Profile, SaleListing, SystemClock};
    use crate::persistence::{InMemoryStore, PondStore};
    use crate::ws::messages::WsMessageType;

    async fn session_with_listing() -> (
        Session,
        mpsc::UnboundedReceiver<ValidationResult>,
        PetId,
        UserId,
        UserId,
    ) {
        let now = Utc::now();
        let store = Arc::new(InMemoryStore::new());
        let seller = Profile::new("seller".to_string(), 0, now);
        let buyer = Profile::new("buyer".to_string(), 1_000, now);
        let pet = Pet::adopt(seller.id, "Kiwi".to_string(), Personality::default(), now);
        let sale = SaleListing::new(pet.id, seller.id, 100, None, now);
        for profile in [&seller, &buyer] {
            let Ok(()) = store.insert_profile(profile).await else {
                panic!("profile insert");
            };
        }
        let Ok(()) = store.insert_pet(&pet).await else {
            panic!("pet insert");
        };
        let Ok(()) = store.insert_sale(&sale).await else {
            panic!("sale insert");
        };

        let market = Arc::new(MarketService::new(
            store,
            Arc::new(SystemClock),
            EventBus::new(16),
        ));
        let (tx, rx) = mpsc::unbounded_channel();
        (Session::new(market, tx), rx, pet.id, seller.id, buyer.id)
    }

    fn command(id: &str, payload: serde_json::Value) -> String {
        serde_json::json!({
            "id": id,
            "type": "command",
            "timestamp": Utc::now(),
            "payload": payload,
        })
        .to_string()
    }

    #[tokio::test]
    async fn malformed_and_unknown_commands_are_errors() {
        let (mut session, _rx, ..) = session_with_listing().await;

        let Some(reply) = session.handle_text("not json") else {
            panic!("expected error reply");
        };
        assert_eq!(reply.msg_type, WsMessageType::Error);

        let Some(reply) = session.handle_text(&command("c1", serde_json::json!({"command": "dance"})))
        else {
            panic!("expected error reply");
        };
        assert_eq!(reply.msg_type, WsMessageType::Error);
        assert_eq!(reply.id, "c1");
    }

    #[tokio::test]
    async fn subscribe_filters_events() {
        let (mut session, _rx, pet_id, ..) = session_with_listing().await;
        assert!(!session.wants(pet_id));

        let Some(reply) = session.handle_text(&command(
            "s1",
            serde_json::json!({"command": "subscribe", "pet_ids": [pet_id.to_string()]}),
        )) else {
            panic!("expected response");
        };
        assert_eq!(reply.msg_type, WsMessageType::Response);
        assert!(session.wants(pet_id));
        assert!(!session.wants(PetId::new()));
    }

    #[tokio::test]
    async fn stale_validation_results_are_dropped() {
        let (mut session, mut rx, pet_id, seller_id, buyer_id) = session_with_listing().await;
        let payload = serde_json::json!({
            "command": "validate_purchase",
            "pet_id": pet_id,
            "seller_id": seller_id,
            "buyer_id": buyer_id,
        });

        assert!(session.handle_text(&command("v1", payload.clone())).is_none());
        assert!(session.handle_text(&command("v2", payload)).is_none());

        let (Some(a), Some(b)) = (rx.recv().await, rx.recv().await) else {
            panic!("expected two validation results");
        };
        let (old, new) = if a.generation < b.generation { (a, b) } else { (b, a) };

        assert!(session.deliver(old).is_none());
        let Some(reply) = session.deliver(new) else {
            panic!("newest result must be delivered");
        };
        assert_eq!(reply.id, "v2");
        assert_eq!(session.generations.pending(), 0);
        assert_eq!(
            reply
                .payload
                .get("eligibility")
                .and_then(|e| e.get("eligible")),
            Some(&serde_json::json!(true))
        );
    }
}
