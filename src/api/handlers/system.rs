//! System endpoints: health check and severity tiers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::dto::SeverityTierDto;
use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always `"healthy"` when the server answers.
    pub status: String,
    /// Server time (RFC 3339).
    pub timestamp: String,
    /// Crate version.
    pub version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `GET /config/severity-tiers` — Severity tier table.
#[utoipa::path(
    get,
    path = "/config/severity-tiers",
    tag = "System",
    summary = "List severity tiers",
    description = "Returns the hail size thresholds, labels and colours used to classify contour bands, lowest tier first.",
    responses(
        (status = 200, description = "Severity tier table", body = Vec<SeverityTierDto>),
    )
)]
pub async fn severity_tiers_handler(State(state): State<AppState>) -> impl IntoResponse {
    let tiers: Vec<SeverityTierDto> = state
        .severity_table
        .tiers()
        .iter()
        .map(SeverityTierDto::from)
        .collect();
    (StatusCode::OK, Json(tiers))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/severity-tiers", get(severity_tiers_handler))
}
