//! Profile handlers: register, get, ledger.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{CreateProfileRequest, LedgerResponse};
use crate::app_state::AppState;
use crate::domain::{Profile, UserId};
use crate::error::{ErrorResponse, PondError};

/// `POST /profiles` — Register a profile.
///
/// # Errors
///
/// Returns [`PondError`] on a malformed username or a taken one.
#[utoipa::path(
    post,
    path = "/api/v1/profiles",
    tag = "Profiles",
    summary = "Create a profile",
    description = "Registers a user with a unique (case-insensitive) username and an optional starting ND balance.",
    request_body = CreateProfileRequest,
    responses(
        (status = 201, description = "Profile created", body = Profile),
        (status = 400, description = "Invalid username or balance", body = ErrorResponse),
        (status = 409, description = "Username taken", body = ErrorResponse),
    )
)]
pub async fn create_profile(
    State(state): State<AppState>,
    Json(req): Json<CreateProfileRequest>,
) -> Result<impl IntoResponse, PondError> {
    let profile = state
        .profile_service
        .create_profile(&req.username, req.starting_balance)
        .await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// `GET /profiles/{id}` — Get a profile and its balance.
///
/// # Errors
///
/// Returns [`PondError::ProfileNotFound`] if it does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/profiles/{id}",
    tag = "Profiles",
    summary = "Get a profile",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
    ),
    responses(
        (status = 200, description = "Profile", body = Profile),
        (status = 404, description = "Profile not found", body = ErrorResponse),
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse, PondError> {
    Ok(Json(state.profile_service.get_profile(id).await?))
}

/// `GET /profiles/{id}/ledger` — ND movements of a user.
///
/// # Errors
///
/// Returns [`PondError::ProfileNotFound`] if it does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/profiles/{id}/ledger",
    tag = "Profiles",
    summary = "Get ledger entries",
    description = "Returns every purchase debit and sale credit of the user, newest first.",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
    ),
    responses(
        (status = 200, description = "Ledger entries", body = LedgerResponse),
        (status = 404, description = "Profile not found", body = ErrorResponse),
    )
)]
pub async fn get_ledger(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse, PondError> {
    let entries = state.profile_service.ledger_for(id).await?;
    Ok(Json(LedgerResponse {
        user_id: id,
        entries,
    }))
}

/// Profile routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profiles", post(create_profile))
        .route("/profiles/{id}", get(get_profile))
        .route("/profiles/{id}/ledger", get(get_ledger))
}
