//! Data Transfer Objects for REST request/response serialization.
//!
//! Domain records that already derive `Serialize` + `ToSchema` (`Pet`,
//! `Profile`, `SaleListing`, `LedgerEntry`) are returned as-is; the types
//! here cover request bodies and composite responses.

pub mod common_dto;
pub mod market_dto;
pub mod pet_dto;
pub mod profile_dto;

pub use common_dto::*;
pub use market_dto::*;
pub use pet_dto::*;
pub use profile_dto::*;
