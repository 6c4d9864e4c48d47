//! Knock handlers: publish and read the knock snapshot.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::put;
use axum::{Json, Router};

use crate::api::dto::{PutKnocksRequest, PutKnocksResponse};
use crate::app_state::AppState;

/// `PUT /knocks` — Replace the knock snapshot.
#[utoipa::path(
    put,
    path = "/api/v1/knocks",
    tag = "Knocks",
    summary = "Publish knock snapshot",
    description = "Stores the complete current knock set and pushes a full or differential update to connected map surfaces.",
    request_body = PutKnocksRequest,
    responses(
        (status = 200, description = "What was published", body = PutKnocksResponse),
    )
)]
pub async fn put_knocks(
    State(state): State<AppState>,
    Json(req): Json<PutKnocksRequest>,
) -> impl IntoResponse {
    let total = req.knocks.len();
    let publication = state.knock_sync.publish(req.knocks).await;
    Json(PutKnocksResponse::new(&publication, total))
}

/// `GET /knocks` — Last published knock snapshot.
#[utoipa::path(
    get,
    path = "/api/v1/knocks",
    tag = "Knocks",
    summary = "Get knock snapshot",
    responses(
        (status = 200, description = "Knock set", body = serde_json::Value),
    )
)]
pub async fn get_knocks(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.knock_sync.snapshot().await)
}

/// Knock routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/knocks", put(put_knocks).get(get_knocks))
}
