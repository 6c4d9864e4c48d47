//! REST endpoint handlers organized by resource.

pub mod contour;
pub mod knock;
pub mod storm;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(storm::routes())
        .merge(contour::routes())
        .merge(knock::routes())
}
