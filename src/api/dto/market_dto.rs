//! Marketplace DTOs: listings, eligibility and purchase outcomes.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::PaginationMeta;
use crate::domain::{BlockReason, Eligibility, PetId, PurchaseState, SaleListing, UserId};
use crate::service::PurchaseOutcome;

/// Request body for `POST /sales`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateListingRequest {
    /// Current owner of the pet.
    pub seller_id: UserId,
    /// Pet to sell.
    pub pet_id: PetId,
    /// Asking price in ND, must be positive.
    pub price_nd: i64,
    /// Reserve the listing for one username (case-insensitive).
    #[serde(default)]
    pub target_username: Option<String>,
}

/// Query for `DELETE /sales/{id}`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CancelListingParams {
    /// Seller withdrawing the listing.
    pub seller_id: UserId,
}

/// Paginated list response for `GET /sales`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListingListResponse {
    /// Active listings, newest first.
    pub data: Vec<SaleListing>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Request body for the eligibility and purchase endpoints.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct PurchaseRequest {
    /// Seller whose listing is being bought.
    pub seller_id: UserId,
    /// Buyer.
    pub buyer_id: UserId,
}

/// Response body for `POST /pets/{id}/purchase/eligibility`.
#[derive(Debug, Serialize, ToSchema)]
pub struct EligibilityResponse {
    /// Whether the buy button should be enabled.
    pub eligible: bool,
    /// Listing the buyer may purchase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale: Option<SaleListing>,
    /// Why the purchase is blocked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<BlockReason>,
    /// Human readable block message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<Eligibility> for EligibilityResponse {
    fn from(eligibility: Eligibility) -> Self {
        match eligibility {
            Eligibility::Eligible(sale) => Self {
                eligible: true,
                sale: Some(sale),
                block_reason: None,
                message: None,
            },
            Eligibility::Blocked(reason) => Self {
                eligible: false,
                sale: None,
                message: Some(reason.to_string()),
                block_reason: Some(reason),
            },
        }
    }
}

/// Response body for `POST /pets/{id}/purchase`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PurchaseResponse {
    /// Terminal state: `blocked`, `succeeded` or `failed`.
    pub state: String,
    /// Whether the pet changed owner.
    pub success: bool,
    /// Listing bought or attempted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale: Option<SaleListing>,
    /// Transfer error for a failed attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Current block reason, from validation or re-validation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<BlockReason>,
    /// Human readable block message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<PurchaseOutcome> for PurchaseResponse {
    fn from(outcome: PurchaseOutcome) -> Self {
        let block_reason = outcome.block_reason().cloned();
        let error = match &outcome.state {
            PurchaseState::Failed { error } => Some(error.clone()),
            _ => None,
        };
        Self {
            state: outcome.state.name().to_string(),
            success: outcome.succeeded(),
            sale: outcome.sale,
            error,
            message: block_reason.as_ref().map(ToString::to_string),
            block_reason,
        }
    }
}
