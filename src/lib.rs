//! # petpond-gateway
//!
//! REST API and WebSocket gateway for PetPond: virtual pets whose hunger
//! and water decay over time, and a marketplace where users trade pets
//! for ND.
//!
//! Stored pet records hold the level at the last interaction; every read
//! derives the current level from the elapsed time, so nothing has to run
//! in the background to make pets hungry.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── PetService / MarketService / ProfileService (service/)
//!     ├── Decay engine, purchase rules, EventBus (domain/)
//!     │
//!     └── PondStore (persistence/): in-memory or PostgreSQL
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::config::PondConfig;
use crate::error::PondError;
use crate::persistence::{InMemoryStore, PondStore, PostgresStore};

/// Upper bound on a single HTTP request. WebSocket connections are not
/// affected once upgraded.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the full application: REST routes, `/ws`, and the HTTP layers.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws::handler::ws_handler))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Opens the store selected by `config.persistence_enabled`, running
/// migrations for PostgreSQL.
///
/// # Errors
///
/// Returns [`PondError::PersistenceError`] if PostgreSQL is enabled and
/// cannot be reached or migrated.
pub async fn open_store(config: &PondConfig) -> Result<Arc<dyn PondStore>, PondError> {
    if config.persistence_enabled {
        let store = PostgresStore::connect(config).await?;
        store.migrate().await?;
        tracing::info!("using PostgreSQL store");
        Ok(Arc::new(store))
    } else {
        tracing::warn!("persistence disabled; state lives in memory only");
        Ok(Arc::new(InMemoryStore::new()))
    }
}
