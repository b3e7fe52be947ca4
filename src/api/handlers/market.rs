//! Marketplace handlers: listings, eligibility, purchase.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, post};
use axum::{Json, Router};

use crate::api::dto::{
    CancelListingParams, CreateListingRequest, EligibilityResponse, ListingListResponse,
    PaginationParams, PurchaseRequest, PurchaseResponse,
};
use crate::app_state::AppState;
use crate::domain::{PetId, SaleId, SaleListing};
use crate::error::{ErrorResponse, PondError};

/// `POST /sales` — Put a pet up for sale.
///
/// # Errors
///
/// Returns [`PondError`] on a bad price, a non-owner seller or a duplicate
/// listing.
#[utoipa::path(
    post,
    path = "/api/v1/sales",
    tag = "Marketplace",
    summary = "Create a listing",
    description = "Lists a pet for sale. Setting `target_username` reserves the listing for that user.",
    request_body = CreateListingRequest,
    responses(
        (status = 201, description = "Listing created", body = SaleListing),
        (status = 400, description = "Invalid price", body = ErrorResponse),
        (status = 403, description = "Seller does not own the pet", body = ErrorResponse),
        (status = 409, description = "Pet already listed", body = ErrorResponse),
    )
)]
pub async fn create_listing(
    State(state): State<AppState>,
    Json(req): Json<CreateListingRequest>,
) -> Result<impl IntoResponse, PondError> {
    let sale = state
        .market_service
        .list_pet_for_sale(req.seller_id, req.pet_id, req.price_nd, req.target_username)
        .await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

/// `GET /sales` — Browse active listings.
///
/// # Errors
///
/// Returns [`PondError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/sales",
    tag = "Marketplace",
    summary = "List active listings",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated listings", body = ListingListResponse),
    )
)]
pub async fn list_listings(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, PondError> {
    let params = params.clamped();
    let page = state
        .market_service
        .active_listings(params.offset(), u64::from(params.per_page))
        .await?;
    Ok(Json(ListingListResponse {
        data: page.listings,
        pagination: params.meta(page.total),
    }))
}

/// `DELETE /sales/{id}` — Withdraw a listing.
///
/// # Errors
///
/// Returns [`PondError`] if the listing is unknown, not the caller's, or
/// already inactive.
#[utoipa::path(
    delete,
    path = "/api/v1/sales/{id}",
    tag = "Marketplace",
    summary = "Cancel a listing",
    params(
        ("id" = uuid::Uuid, Path, description = "Listing UUID"),
        CancelListingParams,
    ),
    responses(
        (status = 204, description = "Listing cancelled"),
        (status = 403, description = "Not the seller", body = ErrorResponse),
        (status = 404, description = "Listing not found", body = ErrorResponse),
        (status = 409, description = "Listing already inactive", body = ErrorResponse),
    )
)]
pub async fn cancel_listing(
    State(state): State<AppState>,
    Path(id): Path<SaleId>,
    Query(params): Query<CancelListingParams>,
) -> Result<impl IntoResponse, PondError> {
    state
        .market_service
        .cancel_listing(params.seller_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /pets/{id}/purchase/eligibility` — Validate without buying.
///
/// # Errors
///
/// Returns [`PondError`] only when the records cannot be loaded; rule
/// violations are part of the response body.
#[utoipa::path(
    post,
    path = "/api/v1/pets/{id}/purchase/eligibility",
    tag = "Marketplace",
    summary = "Check purchase eligibility",
    description = "Runs every purchase rule in order and reports the first that blocks, with a human readable message.",
    params(
        ("id" = uuid::Uuid, Path, description = "Pet UUID"),
    ),
    request_body = PurchaseRequest,
    responses(
        (status = 200, description = "Eligibility result", body = EligibilityResponse),
    )
)]
pub async fn check_eligibility(
    State(state): State<AppState>,
    Path(id): Path<PetId>,
    Json(req): Json<PurchaseRequest>,
) -> Result<impl IntoResponse, PondError> {
    let eligibility = state
        .market_service
        .check_eligibility(id, req.seller_id, req.buyer_id)
        .await?;
    Ok(Json(EligibilityResponse::from(eligibility)))
}

/// `POST /pets/{id}/purchase` — Buy a listed pet.
///
/// # Errors
///
/// Returns [`PondError`] only when validation cannot load its records;
/// blocked and failed attempts are part of the response body.
#[utoipa::path(
    post,
    path = "/api/v1/pets/{id}/purchase",
    tag = "Marketplace",
    summary = "Purchase a pet",
    description = "Validates, transfers the pet and the price atomically, and records ledger entries. A failed transfer is followed by a fresh validation whose block reason is returned.",
    params(
        ("id" = uuid::Uuid, Path, description = "Pet UUID"),
    ),
    request_body = PurchaseRequest,
    responses(
        (status = 200, description = "Purchase outcome", body = PurchaseResponse),
    )
)]
pub async fn purchase_pet(
    State(state): State<AppState>,
    Path(id): Path<PetId>,
    Json(req): Json<PurchaseRequest>,
) -> Result<impl IntoResponse, PondError> {
    let outcome = state
        .market_service
        .purchase(id, req.seller_id, req.buyer_id)
        .await?;
    Ok(Json(PurchaseResponse::from(outcome)))
}

/// Marketplace routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sales", post(create_listing).get(list_listings))
        .route("/sales/{id}", delete(cancel_listing))
        .route("/pets/{id}/purchase/eligibility", post(check_eligibility))
        .route("/pets/{id}/purchase", post(purchase_pet))
}
