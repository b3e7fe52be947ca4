//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use super::dto;
use super::handlers::{market, pet, profile, system};
use crate::domain;
use crate::error::{ErrorBody, ErrorResponse};

/// Aggregated OpenAPI description served at `/api-docs/openapi.json`.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "petpond-gateway",
        description = "Virtual pets with decaying vitals and an ND marketplace."
    ),
    paths(
        system::health_handler,
        system::decay_policy_handler,
        profile::create_profile,
        profile::get_profile,
        profile::get_ledger,
        pet::adopt_pet,
        pet::get_pet,
        pet::feed_pet,
        pet::water_pet,
        market::create_listing,
        market::list_listings,
        market::cancel_listing,
        market::check_eligibility,
        market::purchase_pet,
    ),
    components(schemas(
        ErrorResponse,
        ErrorBody,
        domain::Pet,
        domain::Personality,
        domain::Profile,
        domain::SaleListing,
        domain::LedgerEntry,
        domain::LedgerKind,
        domain::BlockReason,
        dto::ActorRequest,
        dto::AdoptPetRequest,
        dto::PetVitalsResponse,
        dto::DecayPolicyResponse,
        dto::CreateProfileRequest,
        dto::LedgerResponse,
        dto::CreateListingRequest,
        dto::ListingListResponse,
        dto::PaginationMeta,
        dto::PurchaseRequest,
        dto::EligibilityResponse,
        dto::PurchaseResponse,
    )),
    tags(
        (name = "System", description = "Health and configuration"),
        (name = "Profiles", description = "Users and ND balances"),
        (name = "Pets", description = "Adoption, vitals, feeding and watering"),
        (name = "Marketplace", description = "Listings and purchases"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/config/decay-policy",
            "/api/v1/profiles",
            "/api/v1/pets/{id}/feed",
            "/api/v1/sales/{id}",
            "/api/v1/pets/{id}/purchase",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
