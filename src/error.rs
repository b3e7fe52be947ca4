//! Gateway error types with HTTP status code mapping.
//!
//! [`PondError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.
//!
//! Purchase validation failures are *not* errors: they are returned as
//! [`crate::domain::BlockReason`] values so clients can render them inline.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::purchase::InvalidTransition;
use crate::domain::{PetId, SaleId, UserId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4001,
///     "message": "interaction refused: Mochi is already full",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category              | HTTP Status                  |
/// |-----------|-----------------------|------------------------------|
/// | 1000–1999 | Validation            | 400 Bad Request              |
/// | 2000–2999 | Not Found / Conflict  | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server                | 500 Internal Server Error    |
/// | 4000–4999 | Domain refusal        | 422 / 403                    |
#[derive(Debug, thiserror::Error)]
pub enum PondError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Pet with the given ID was not found.
    #[error("pet not found: {0}")]
    PetNotFound(PetId),

    /// Profile with the given ID was not found.
    #[error("profile not found: {0}")]
    ProfileNotFound(UserId),

    /// Sale listing with the given ID was not found.
    #[error("sale listing not found: {0}")]
    SaleNotFound(SaleId),

    /// The write would violate a uniqueness rule.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The interaction gate is closed (the stat is already full).
    #[error("interaction refused: {0}")]
    InteractionRefused(String),

    /// The acting user does not own the resource.
    #[error("not the owner: {0}")]
    NotOwner(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PondError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::PetNotFound(_) => 2001,
            Self::ProfileNotFound(_) => 2002,
            Self::SaleNotFound(_) => 2003,
            Self::Conflict(_) => 2004,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::InteractionRefused(_) => 4001,
            Self::NotOwner(_) => 4002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::PetNotFound(_) | Self::ProfileNotFound(_) | Self::SaleNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InteractionRefused(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotOwner(_) => StatusCode::FORBIDDEN,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<InvalidTransition> for PondError {
    fn from(err: InvalidTransition) -> Self {
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for PondError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_fall_in_documented_ranges() {
        assert_eq!(PondError::InvalidRequest(String::new()).error_code() / 1000, 1);
        assert_eq!(PondError::PetNotFound(PetId::new()).error_code() / 1000, 2);
        assert_eq!(PondError::Conflict(String::new()).error_code() / 1000, 2);
        assert_eq!(PondError::PersistenceError(String::new()).error_code() / 1000, 3);
        assert_eq!(PondError::InteractionRefused(String::new()).error_code() / 1000, 4);
    }

    #[test]
    fn statuses() {
        assert_eq!(
            PondError::SaleNotFound(SaleId::new()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            PondError::InteractionRefused("full".to_string()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            PondError::NotOwner("pet".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn into_response_keeps_status() {
        let response = PondError::Conflict("username taken".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
