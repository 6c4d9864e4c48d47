//! Contour handlers: current overlay, pipeline status, preferences.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};

use crate::api::dto::{ContourPreferencesRequest, ContourResponse, ContourStatusResponse};
use crate::app_state::AppState;

/// `GET /contours` — Current contour overlay.
#[utoipa::path(
    get,
    path = "/api/v1/contours",
    tag = "Contours",
    summary = "Get current contours",
    description = "Returns the last emitted GeoJSON FeatureCollection. An empty collection means there is no data to show.",
    responses(
        (status = 200, description = "Current overlay", body = ContourResponse),
    )
)]
pub async fn get_contours(State(state): State<AppState>) -> impl IntoResponse {
    let pipeline = state.pipeline();
    let status = pipeline.status();
    Json(ContourResponse {
        contours: (*pipeline.current()).clone(),
        strategy: status.last_strategy.map(str::to_string),
        generating: status.generating,
        updated_at: status.updated_at,
    })
}

/// `GET /contours/status` — Pipeline state.
#[utoipa::path(
    get,
    path = "/api/v1/contours/status",
    tag = "Contours",
    summary = "Get contour pipeline status",
    responses(
        (status = 200, description = "Pipeline status", body = ContourStatusResponse),
    )
)]
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(ContourStatusResponse::new(
        state.pipeline().status(),
        state.storm_service.smooth_contours(),
    ))
}

/// `PUT /contours/preferences` — Toggle smooth contours.
#[utoipa::path(
    put,
    path = "/api/v1/contours/preferences",
    tag = "Contours",
    summary = "Set contour preferences",
    description = "Switches between the smooth generator (with fallback) and the simple generator. Regenerates when the preference changes.",
    request_body = ContourPreferencesRequest,
    responses(
        (status = 200, description = "Updated status", body = ContourStatusResponse),
    )
)]
pub async fn put_preferences(
    State(state): State<AppState>,
    Json(req): Json<ContourPreferencesRequest>,
) -> impl IntoResponse {
    state
        .storm_service
        .set_smooth_contours(req.use_smooth_contours)
        .await;
    Json(ContourStatusResponse::new(
        state.pipeline().status(),
        state.storm_service.smooth_contours(),
    ))
}

/// Contour routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/contours", get(get_contours))
        .route("/contours/status", get(get_status))
        .route("/contours/preferences", put(put_preferences))
}
