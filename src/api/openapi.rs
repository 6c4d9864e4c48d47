//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use crate::api::dto::{
    BoundsDto, ContourPreferencesRequest, ContourResponse, ContourStatusResponse,
    CreateStormRequest, IngestReportsRequest, IngestReportsResponse, PaginationMeta,
    PutKnocksRequest, PutKnocksResponse, RejectedReportDto, ReportDto, SeverityTierDto,
    StormDetailResponse, StormListResponse, StormSummaryDto, ToggleStormRequest,
};
use crate::api::handlers::{contour, knock, storm, system};
use crate::error::{ErrorBody, ErrorResponse};

/// Generated OpenAPI specification, served at `/api-docs/openapi.json`.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "hailmap-gateway",
        description = "Hail contour overlays, storm management and knock synchronization for canvassing maps."
    ),
    paths(
        storm::ingest_reports,
        storm::create_storm,
        storm::list_storms,
        storm::get_storm,
        storm::toggle_storm,
        storm::delete_storm,
        contour::get_contours,
        contour::get_status,
        contour::put_preferences,
        knock::put_knocks,
        knock::get_knocks,
        system::health_handler,
        system::severity_tiers_handler,
    ),
    components(schemas(
        BoundsDto,
        ContourPreferencesRequest,
        ContourResponse,
        ContourStatusResponse,
        CreateStormRequest,
        ErrorBody,
        ErrorResponse,
        IngestReportsRequest,
        IngestReportsResponse,
        PaginationMeta,
        PutKnocksRequest,
        PutKnocksResponse,
        RejectedReportDto,
        ReportDto,
        SeverityTierDto,
        StormDetailResponse,
        StormListResponse,
        StormSummaryDto,
        ToggleStormRequest,
        system::HealthResponse,
    )),
    tags(
        (name = "Storms", description = "Storm events and report ingestion"),
        (name = "Contours", description = "Hail severity overlay"),
        (name = "Knocks", description = "Canvassing knock markers"),
        (name = "System", description = "Health and configuration"),
    )
)]
pub struct ApiDoc;
