//! System endpoints: health check and decay policy.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::dto::DecayPolicyResponse;
use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    ws_subscribers: usize,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, current timestamp and the number of live event subscribers.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            ws_subscribers: state.event_bus.receiver_count(),
        }),
    )
}

/// `GET /config/decay-policy` — Active decay constants.
#[utoipa::path(
    get,
    path = "/config/decay-policy",
    tag = "System",
    summary = "Get decay policy",
    description = "Returns the depletion durations, grace window and per-hour rates the server decays vitals with.",
    responses(
        (status = 200, description = "Decay policy", body = DecayPolicyResponse),
    )
)]
pub async fn decay_policy_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(DecayPolicyResponse::from(state.pet_service.policy()))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/decay-policy", get(decay_policy_handler))
}
