//! Contour overlay, status and preference DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::contour::{ContourFeatureCollection, SeverityTier};
use crate::service::PipelineStatus;

/// Response body for `GET /contours`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ContourResponse {
    /// GeoJSON `FeatureCollection`; empty when there is no data.
    #[schema(value_type = Object)]
    pub contours: ContourFeatureCollection,
    /// Strategy that produced the collection.
    pub strategy: Option<String>,
    /// Whether a newer collection is being generated.
    pub generating: bool,
    /// When the collection was emitted.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Response body for `GET /contours/status`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ContourStatusResponse {
    /// Pipeline phase (`idle`, `scheduled`, `generating`, `emitted`, `failed`).
    pub phase: String,
    /// Whether a generation run is in progress.
    pub generating: bool,
    /// Strategy of the last emitted collection.
    pub last_strategy: Option<String>,
    /// Feature count of the last emitted collection.
    pub feature_count: usize,
    /// When the last collection was emitted.
    pub updated_at: Option<DateTime<Utc>>,
    /// Malformed reports dropped from the latest submission.
    pub rejected_reports: usize,
    /// Current smooth-contour preference.
    pub use_smooth_contours: bool,
}

impl ContourStatusResponse {
    /// Builds the response from a pipeline snapshot and the preference.
    #[must_use]
    pub fn new(status: PipelineStatus, use_smooth_contours: bool) -> Self {
        Self {
            phase: status.phase.as_str().to_string(),
            generating: status.generating,
            last_strategy: status.last_strategy.map(str::to_string),
            feature_count: status.feature_count,
            updated_at: status.updated_at,
            rejected_reports: status.rejected_reports,
            use_smooth_contours,
        }
    }
}

/// Request body for `PUT /contours/preferences`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ContourPreferencesRequest {
    /// Use the smooth generator (falls back to simple on failure).
    pub use_smooth_contours: bool,
}

/// One entry of `GET /config/severity-tiers`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SeverityTierDto {
    /// Ordinal level, 0 = least severe.
    pub level: u8,
    /// Minimum hail size in inches.
    pub threshold_in: f64,
    /// Display label.
    pub label: String,
    /// Display colour (`#rrggbb`).
    pub color: String,
}

impl From<&SeverityTier> for SeverityTierDto {
    fn from(t: &SeverityTier) -> Self {
        Self {
            level: t.level,
            threshold_in: t.threshold_in,
            label: t.label.clone(),
            color: t.color.clone(),
        }
    }
}
