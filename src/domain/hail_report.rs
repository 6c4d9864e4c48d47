//! Point hail observations.
//!
//! Sizes are hail diameters in inches, the unit NWS local storm reports and
//! MESH products use.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ReportId;
use crate::error::{MalformedField, MalformedReport};

/// Lowest weight a non-verified report contributes to the density surface.
const MIN_REPORT_WEIGHT: f64 = 0.5;

/// A single hail observation, radar-estimated or human-reported.
///
/// Immutable once constructed; the builder-style `with_*` methods consume
/// the value and are meant for construction only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HailReport {
    id: ReportId,
    lat: f64,
    lng: f64,
    size_in: f64,
    observed_at: DateTime<Utc>,
    #[serde(default)]
    ground_truth: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confidence: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_label: Option<String>,
}

impl HailReport {
    /// Creates a radar-estimated report with a fresh identifier.
    #[must_use]
    pub fn new(lat: f64, lng: f64, size_in: f64, observed_at: DateTime<Utc>) -> Self {
        Self {
            id: ReportId::new(),
            lat,
            lng,
            size_in,
            observed_at,
            ground_truth: false,
            confidence: None,
            source_label: None,
        }
    }

    /// Replaces the generated identifier.
    #[must_use]
    pub fn with_id(mut self, id: ReportId) -> Self {
        self.id = id;
        self
    }

    /// Marks the report as verified ground truth.
    #[must_use]
    pub fn verified(mut self) -> Self {
        self.ground_truth = true;
        self
    }

    /// Attaches a confidence score (0–100).
    #[must_use]
    pub fn with_confidence(mut self, confidence: u8) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Attaches a source city or label.
    #[must_use]
    pub fn with_source(mut self, label: impl Into<String>) -> Self {
        self.source_label = Some(label.into());
        self
    }

    /// Report identifier.
    #[must_use]
    pub const fn id(&self) -> ReportId {
        self.id
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn lng(&self) -> f64 {
        self.lng
    }

    /// Hail diameter in inches.
    #[must_use]
    pub const fn size_in(&self) -> f64 {
        self.size_in
    }

    /// Observation time.
    #[must_use]
    pub const fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    /// Whether the report is verified ground truth.
    #[must_use]
    pub const fn is_ground_truth(&self) -> bool {
        self.ground_truth
    }

    /// Confidence score, if any.
    #[must_use]
    pub const fn confidence(&self) -> Option<u8> {
        self.confidence
    }

    /// Source city or label, if any.
    #[must_use]
    pub fn source_label(&self) -> Option<&str> {
        self.source_label.as_deref()
    }

    /// Checks coordinates, size and confidence.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedReport`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), MalformedReport> {
        let field = if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            Some(MalformedField::Latitude)
        } else if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            Some(MalformedField::Longitude)
        } else if !self.size_in.is_finite() || self.size_in <= 0.0 {
            Some(MalformedField::Size)
        } else if self.confidence.is_some_and(|c| c > 100) {
            Some(MalformedField::Confidence)
        } else {
            None
        };
        match field {
            Some(field) => Err(MalformedReport {
                report_id: self.id,
                field,
            }),
            None => Ok(()),
        }
    }

    /// Contribution of this report to a density surface, in `[0.5, 1.0]`.
    ///
    /// Ground truth always weighs 1.0; otherwise the confidence score
    /// scales the weight, and a missing score counts as full confidence.
    #[must_use]
    pub fn weight(&self) -> f64 {
        if self.ground_truth {
            return 1.0;
        }
        self.confidence.map_or(1.0, |c| {
            (f64::from(c) / 100.0).clamp(MIN_REPORT_WEIGHT, 1.0)
        })
    }
}

/// Splits reports into valid ones and rejection reasons, preserving order.
#[must_use]
pub fn partition_valid(reports: &[HailReport]) -> (Vec<HailReport>, Vec<MalformedReport>) {
    let mut valid = Vec::with_capacity(reports.len());
    let mut rejected = Vec::new();
    for report in reports {
        match report.validate() {
            Ok(()) => valid.push(report.clone()),
            Err(e) => rejected.push(e),
        }
    }
    (valid, rejected)
}
