//! Storm and report DTOs for ingest, create, get, list and toggle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::{BoundsDto, PaginationMeta};
use crate::domain::{HailReport, ReportId, StormEvent, StormId, StormSummary};
use crate::error::MalformedReport;

/// A hail report as sent and returned over REST.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportDto {
    /// Report identifier; generated when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub id: Option<ReportId>,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Hail diameter in inches.
    pub size_in: f64,
    /// Observation time (ISO-8601).
    pub observed_at: DateTime<Utc>,
    /// Verified ground truth rather than a radar estimate.
    #[serde(default)]
    pub ground_truth: bool,
    /// Confidence score in `[0, 100]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
    /// Source city or label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_label: Option<String>,
}

impl From<ReportDto> for HailReport {
    fn from(dto: ReportDto) -> Self {
        let mut report = HailReport::new(dto.lat, dto.lng, dto.size_in, dto.observed_at);
        if let Some(id) = dto.id {
            report = report.with_id(id);
        }
        if dto.ground_truth {
            report = report.verified();
        }
        if let Some(confidence) = dto.confidence {
            report = report.with_confidence(confidence);
        }
        if let Some(label) = dto.source_label {
            report = report.with_source(label);
        }
        report
    }
}

impl From<&HailReport> for ReportDto {
    fn from(r: &HailReport) -> Self {
        Self {
            id: Some(r.id()),
            lat: r.lat(),
            lng: r.lng(),
            size_in: r.size_in(),
            observed_at: r.observed_at(),
            ground_truth: r.is_ground_truth(),
            confidence: r.confidence(),
            source_label: r.source_label().map(str::to_string),
        }
    }
}

fn default_source() -> String {
    "manual".to_string()
}

/// Request body for `POST /reports/ingest`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IngestReportsRequest {
    /// Data source label applied to every created storm.
    #[serde(default = "default_source")]
    pub source: String,
    /// Raw reports to group into storms.
    pub reports: Vec<ReportDto>,
}

/// A report rejected during ingestion.
#[derive(Debug, Serialize, ToSchema)]
pub struct RejectedReportDto {
    /// Identifier of the rejected report.
    #[schema(value_type = String, format = Uuid)]
    pub report_id: ReportId,
    /// Why it was rejected.
    pub reason: String,
}

impl From<&MalformedReport> for RejectedReportDto {
    fn from(m: &MalformedReport) -> Self {
        Self {
            report_id: m.report_id,
            reason: m.to_string(),
        }
    }
}

/// Response body for `POST /reports/ingest`.
#[derive(Debug, Serialize, ToSchema)]
pub struct IngestReportsResponse {
    /// Storms created from the batch.
    pub storms: Vec<StormSummaryDto>,
    /// Reports dropped as malformed.
    pub rejected: Vec<RejectedReportDto>,
}

/// Request body for `POST /storms`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateStormRequest {
    /// Display name.
    pub name: String,
    /// Data source label.
    #[serde(default = "default_source")]
    pub source: String,
    /// Reports belonging to the storm.
    pub reports: Vec<ReportDto>,
}

/// Request body for `PATCH /storms/{id}`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ToggleStormRequest {
    /// New enabled flag.
    pub enabled: bool,
}

/// Storm summary for list responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StormSummaryDto {
    /// Storm identifier.
    #[schema(value_type = String, format = Uuid)]
    pub id: StormId,
    /// Display name.
    pub name: String,
    /// Time of the earliest report.
    pub started_at: DateTime<Utc>,
    /// Whether the storm contributes to the contour overlay.
    pub enabled: bool,
    /// Bounds of all reports.
    pub bounds: BoundsDto,
    /// Number of reports.
    pub report_count: usize,
    /// Largest hail size in inches.
    pub max_size_in: f64,
    /// Data source label.
    pub source: String,
}

impl From<StormSummary> for StormSummaryDto {
    fn from(s: StormSummary) -> Self {
        Self {
            id: s.id,
            name: s.name,
            started_at: s.started_at,
            enabled: s.enabled,
            bounds: s.bounds.into(),
            report_count: s.report_count,
            max_size_in: s.max_size_in,
            source: s.source,
        }
    }
}

/// Full storm for `GET /storms/{id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct StormDetailResponse {
    /// Storm summary.
    pub storm: StormSummaryDto,
    /// Reports ordered by observation time.
    pub reports: Vec<ReportDto>,
}

impl From<StormEvent> for StormDetailResponse {
    fn from(storm: StormEvent) -> Self {
        let reports = storm.reports.iter().map(ReportDto::from).collect();
        Self {
            storm: StormSummary::from(&storm).into(),
            reports,
        }
    }
}

/// Paginated list response for `GET /storms`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StormListResponse {
    /// Storms on this page, newest first.
    pub data: Vec<StormSummaryDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn report_dto_defaults_optional_fields() {
        let json = r#"{"lat":35.2,"lng":-97.4,"size_in":1.75,"observed_at":"2024-05-01T20:00:00Z"}"#;
        let Ok(dto) = serde_json::from_str::<ReportDto>(json) else {
            panic!("valid report json");
        };
        let report = HailReport::from(dto);
        assert!(!report.is_ground_truth());
        assert_eq!(report.confidence(), None);
        assert!(report.validate().is_ok());
    }

    #[test]
    fn report_dto_keeps_supplied_id() {
        let id = ReportId::new();
        let dto = ReportDto {
            id: Some(id),
            lat: 35.0,
            lng: -97.0,
            size_in: 1.0,
            observed_at: Utc::now(),
            ground_truth: true,
            confidence: Some(80),
            source_label: Some("Moore, OK".to_string()),
        };
        let report = HailReport::from(dto);
        assert_eq!(report.id(), id);
        assert!(report.is_ground_truth());
        assert_eq!(ReportDto::from(&report).source_label.as_deref(), Some("Moore, OK"));
    }
}
