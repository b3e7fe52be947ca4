//! Pet handlers: adopt, display, feed, water.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{ActorRequest, AdoptPetRequest, PetVitalsResponse};
use crate::app_state::AppState;
use crate::domain::{Pet, PetId};
use crate::error::{ErrorResponse, PondError};

/// `POST /pets` — Adopt a new pet.
///
/// # Errors
///
/// Returns [`PondError`] on an invalid name or unknown owner.
#[utoipa::path(
    post,
    path = "/api/v1/pets",
    tag = "Pets",
    summary = "Adopt a pet",
    description = "Creates a pet with full hunger and water for the given owner.",
    request_body = AdoptPetRequest,
    responses(
        (status = 201, description = "Pet adopted", body = Pet),
        (status = 400, description = "Invalid name", body = ErrorResponse),
        (status = 404, description = "Owner not found", body = ErrorResponse),
    )
)]
pub async fn adopt_pet(
    State(state): State<AppState>,
    Json(req): Json<AdoptPetRequest>,
) -> Result<impl IntoResponse, PondError> {
    let pet = state
        .pet_service
        .adopt_pet(req.owner_id, &req.name, req.personality.unwrap_or_default())
        .await?;
    Ok((StatusCode::CREATED, Json(pet)))
}

/// `GET /pets/{id}` — Display a pet with its current vitals.
///
/// # Errors
///
/// Returns [`PondError::PetNotFound`] if the pet does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/pets/{id}",
    tag = "Pets",
    summary = "Get pet vitals",
    description = "Returns the pet with hunger and water decayed to the current instant, the feed/water gates and the advisory minutes until each gate opens.",
    params(
        ("id" = uuid::Uuid, Path, description = "Pet UUID"),
    ),
    responses(
        (status = 200, description = "Pet vitals", body = PetVitalsResponse),
        (status = 404, description = "Pet not found", body = ErrorResponse),
    )
)]
pub async fn get_pet(
    State(state): State<AppState>,
    Path(id): Path<PetId>,
) -> Result<impl IntoResponse, PondError> {
    let report = state.pet_service.pet_vitals(id).await?;
    Ok(Json(PetVitalsResponse::from(report)))
}

/// `POST /pets/{id}/feed` — Refill hunger.
///
/// # Errors
///
/// Returns [`PondError::InteractionRefused`] while the pet is still full.
#[utoipa::path(
    post,
    path = "/api/v1/pets/{id}/feed",
    tag = "Pets",
    summary = "Feed a pet",
    description = "Any registered user may feed any pet once its hunger has dropped below full.",
    params(
        ("id" = uuid::Uuid, Path, description = "Pet UUID"),
    ),
    request_body = ActorRequest,
    responses(
        (status = 200, description = "Pet fed", body = PetVitalsResponse),
        (status = 404, description = "Pet or user not found", body = ErrorResponse),
        (status = 422, description = "Pet is already full", body = ErrorResponse),
    )
)]
pub async fn feed_pet(
    State(state): State<AppState>,
    Path(id): Path<PetId>,
    Json(req): Json<ActorRequest>,
) -> Result<impl IntoResponse, PondError> {
    let report = state.pet_service.feed(id, req.user_id).await?;
    Ok(Json(PetVitalsResponse::from(report)))
}

/// `POST /pets/{id}/water` — Refill water.
///
/// # Errors
///
/// Returns [`PondError::InteractionRefused`] while the pet is still full.
#[utoipa::path(
    post,
    path = "/api/v1/pets/{id}/water",
    tag = "Pets",
    summary = "Water a pet",
    description = "Any registered user may water any pet once its water has dropped below full.",
    params(
        ("id" = uuid::Uuid, Path, description = "Pet UUID"),
    ),
    request_body = ActorRequest,
    responses(
        (status = 200, description = "Pet watered", body = PetVitalsResponse),
        (status = 404, description = "Pet or user not found", body = ErrorResponse),
        (status = 422, description = "Pet is already full", body = ErrorResponse),
    )
)]
pub async fn water_pet(
    State(state): State<AppState>,
    Path(id): Path<PetId>,
    Json(req): Json<ActorRequest>,
) -> Result<impl IntoResponse, PondError> {
    let report = state.pet_service.water(id, req.user_id).await?;
    Ok(Json(PetVitalsResponse::from(report)))
}

/// Pet routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pets", post(adopt_pet))
        .route("/pets/{id}", get(get_pet))
        .route("/pets/{id}/feed", post(feed_pet))
        .route("/pets/{id}/water", post(water_pet))
}
