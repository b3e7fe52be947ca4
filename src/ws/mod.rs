//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` streams pet events to subscribed
//! clients and answers `validate_purchase` commands, delivering only the
//! newest result per pet.

pub mod connection;
pub mod generation;
pub mod handler;
pub mod messages;
pub mod subscription;
