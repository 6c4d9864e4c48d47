//! Storm handlers: ingest, create, list, get, toggle, delete.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    CreateStormRequest, IngestReportsRequest, IngestReportsResponse, PaginationParams,
    RejectedReportDto, StormDetailResponse, StormListResponse, StormSummaryDto, ToggleStormRequest,
};
use crate::app_state::AppState;
use crate::domain::{HailReport, StormId};
use crate::error::{ErrorResponse, GatewayError};

/// `POST /reports/ingest` — Group raw reports into storms.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] if the batch has no valid report.
#[utoipa::path(
    post,
    path = "/api/v1/reports/ingest",
    tag = "Storms",
    summary = "Ingest hail reports",
    description = "Groups a raw report batch into storm events by time gap and distance. Malformed reports are dropped and listed in the response.",
    request_body = IngestReportsRequest,
    responses(
        (status = 201, description = "Storms created", body = IngestReportsResponse),
        (status = 400, description = "No valid reports", body = ErrorResponse),
    )
)]
pub async fn ingest_reports(
    State(state): State<AppState>,
    Json(req): Json<IngestReportsRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let reports: Vec<HailReport> = req.reports.into_iter().map(HailReport::from).collect();
    let outcome = state
        .storm_service
        .ingest_reports(reports, &req.source)
        .await?;

    let response = IngestReportsResponse {
        storms: outcome.storms.into_iter().map(StormSummaryDto::from).collect(),
        rejected: outcome.rejected.iter().map(RejectedReportDto::from).collect(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `POST /storms` — Add a pre-grouped storm.
///
/// # Errors
///
/// Returns [`GatewayError`] if the storm is empty or a report is malformed.
#[utoipa::path(
    post,
    path = "/api/v1/storms",
    tag = "Storms",
    summary = "Create a storm",
    description = "Stores one storm event from its reports. The storm starts enabled and the contour overlay is regenerated.",
    request_body = CreateStormRequest,
    responses(
        (status = 201, description = "Storm created", body = StormSummaryDto),
        (status = 400, description = "Empty storm or malformed report", body = ErrorResponse),
    )
)]
pub async fn create_storm(
    State(state): State<AppState>,
    Json(req): Json<CreateStormRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let reports: Vec<HailReport> = req.reports.into_iter().map(HailReport::from).collect();
    let summary = state
        .storm_service
        .add_storm(&req.name, &req.source, reports)
        .await?;
    Ok((StatusCode::CREATED, Json(StormSummaryDto::from(summary))))
}

/// `GET /storms` — List storms, newest first.
///
/// # Errors
///
/// Never fails; the `Result` keeps the handler signature uniform.
#[utoipa::path(
    get,
    path = "/api/v1/storms",
    tag = "Storms",
    summary = "List storms",
    description = "Returns a paginated list of all storms sorted by start time, newest first.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated storm list", body = StormListResponse),
    )
)]
pub async fn list_storms(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let summaries = state.storm_service.get_active_storms().await;
    let (page, pagination) = params.paginate(summaries);
    Ok(Json(StormListResponse {
        data: page.into_iter().map(StormSummaryDto::from).collect(),
        pagination,
    }))
}

/// `GET /storms/{id}` — Get a storm with its reports.
///
/// # Errors
///
/// Returns [`GatewayError::StormNotFound`] if the storm does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/storms/{id}",
    tag = "Storms",
    summary = "Get storm details",
    params(
        ("id" = uuid::Uuid, Path, description = "Storm UUID"),
    ),
    responses(
        (status = 200, description = "Storm details", body = StormDetailResponse),
        (status = 404, description = "Storm not found", body = ErrorResponse),
    )
)]
pub async fn get_storm(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let storm = state
        .storm_service
        .get_storm(StormId::from_uuid(id))
        .await?;
    Ok(Json(StormDetailResponse::from(storm)))
}

/// `PATCH /storms/{id}` — Enable or disable a storm.
///
/// # Errors
///
/// Returns [`GatewayError::StormNotFound`] if the storm does not exist.
#[utoipa::path(
    patch,
    path = "/api/v1/storms/{id}",
    tag = "Storms",
    summary = "Toggle a storm",
    description = "Sets the enabled flag. Only enabled storms contribute to the contour overlay.",
    params(
        ("id" = uuid::Uuid, Path, description = "Storm UUID"),
    ),
    request_body = ToggleStormRequest,
    responses(
        (status = 200, description = "Updated storm", body = StormSummaryDto),
        (status = 404, description = "Storm not found", body = ErrorResponse),
    )
)]
pub async fn toggle_storm(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<ToggleStormRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let summary = state
        .storm_service
        .toggle_storm(StormId::from_uuid(id), req.enabled)
        .await?;
    Ok(Json(StormSummaryDto::from(summary)))
}

/// `DELETE /storms/{id}` — Delete a storm.
///
/// # Errors
///
/// Returns [`GatewayError::StormNotFound`] if the storm does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/storms/{id}",
    tag = "Storms",
    summary = "Delete a storm",
    params(
        ("id" = uuid::Uuid, Path, description = "Storm UUID"),
    ),
    responses(
        (status = 204, description = "Storm deleted"),
        (status = 404, description = "Storm not found", body = ErrorResponse),
    )
)]
pub async fn delete_storm(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    state
        .storm_service
        .delete_storm(StormId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Storm and report routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/ingest", post(ingest_reports))
        .route("/storms", post(create_storm).get(list_storms))
        .route(
            "/storms/{id}",
            get(get_storm).patch(toggle_storm).delete(delete_storm),
        )
}
