//! WebSocket message types: envelope, commands, and events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{PetId, UserId};

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// A response to the command with id `id`.
    #[must_use]
    pub fn response(id: String, payload: serde_json::Value) -> Self {
        Self {
            id,
            msg_type: WsMessageType::Response,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// An error reply. `id` is empty when the command could not be read.
    #[must_use]
    pub fn error(id: String, code: u32, message: &str) -> Self {
        Self {
            id,
            msg_type: WsMessageType::Error,
            timestamp: Utc::now(),
            payload: serde_json::json!({
                "code": code,
                "message": message,
            }),
        }
    }

    /// A broadcast event with a fresh server id.
    #[must_use]
    pub fn event(payload: serde_json::Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            msg_type: WsMessageType::Event,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Serializes the envelope, or `None` if serialization fails.
    #[must_use]
    pub fn to_json(&self) -> Option<String> {
        serde_json::to_string(self).ok()
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands that a client can send over WebSocket, carried in the
/// envelope payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Subscribe to events for specific pets.
    Subscribe {
        /// Pet IDs to subscribe to. Use `["*"]` for every pet.
        pet_ids: Vec<String>,
    },
    /// Unsubscribe from events for specific pets.
    Unsubscribe {
        /// Pet IDs to unsubscribe from.
        pet_ids: Vec<String>,
    },
    /// Run the purchase rules for a listing. Only the result of the
    /// newest request per pet is delivered.
    ValidatePurchase {
        /// Pet on sale.
        pet_id: PetId,
        /// Seller of the listing.
        seller_id: UserId,
        /// Prospective buyer.
        buyer_id: UserId,
    },
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parses_validate_purchase_command() {
        let pet = PetId::new();
        let payload = serde_json::json!({
            "command": "validate_purchase",
            "pet_id": pet,
            "seller_id": UserId::new(),
            "buyer_id": UserId::new(),
        });
        let Ok(WsCommand::ValidatePurchase { pet_id, .. }) =
            serde_json::from_value::<WsCommand>(payload)
        else {
            panic!("expected validate_purchase");
        };
        assert_eq!(pet_id, pet);
    }

    #[test]
    fn envelope_uses_type_field() {
        let Some(json) = WsMessage::error(String::new(), 400, "malformed JSON").to_json() else {
            panic!("serialization failed");
        };
        assert!(json.contains("\"type\":\"error\""));
        assert!(json.contains("malformed JSON"));
    }
}
