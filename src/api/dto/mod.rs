//! Data Transfer Objects for REST request/response serialization.
//!
//! Contour collections and knock entities are already in their wire shape
//! and pass through unchanged.

pub mod common_dto;
pub mod contour_dto;
pub mod knock_dto;
pub mod storm_dto;

pub use common_dto::*;
pub use contour_dto::*;
pub use knock_dto::*;
pub use storm_dto::*;
