//! Storm events: spatio-temporal clusters of hail reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{HailReport, StormId};

/// Axis-aligned geographic bounds in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    /// Northernmost latitude.
    pub north: f64,
    /// Southernmost latitude.
    pub south: f64,
    /// Easternmost longitude.
    pub east: f64,
    /// Westernmost longitude.
    pub west: f64,
}

impl GeoBounds {
    /// Bounds of a single point.
    #[must_use]
    pub const fn point(lat: f64, lng: f64) -> Self {
        Self {
            north: lat,
            south: lat,
            east: lng,
            west: lng,
        }
    }

    /// Smallest bounds containing every report, or `None` when empty.
    #[must_use]
    pub fn from_reports(reports: &[HailReport]) -> Option<Self> {
        let (first, rest) = reports.split_first()?;
        let mut bounds = Self::point(first.lat(), first.lng());
        for r in rest {
            bounds.extend(r.lat(), r.lng());
        }
        Some(bounds)
    }

    /// Grows the bounds to include a point.
    pub fn extend(&mut self, lat: f64, lng: f64) {
        self.north = self.north.max(lat);
        self.south = self.south.min(lat);
        self.east = self.east.max(lng);
        self.west = self.west.min(lng);
    }

    /// Centre point as `(lat, lng)`.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        ((self.north + self.south) / 2.0, (self.east + self.west) / 2.0)
    }

    /// Returns `true` if the point lies inside or on the bounds.
    #[must_use]
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        (self.south..=self.north).contains(&lat) && (self.west..=self.east).contains(&lng)
    }
}

/// A named group of hail reports observed in one storm.
///
/// Reports are never mutated in place; only `enabled` changes after
/// creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StormEvent {
    /// Unique storm identifier.
    pub id: StormId,
    /// Display name (e.g. `"Norman, OK 2024-05-01"`).
    pub name: String,
    /// Time of the earliest report.
    pub started_at: DateTime<Utc>,
    /// Whether the storm contributes to the contour overlay.
    pub enabled: bool,
    /// Bounds of all reports.
    pub bounds: GeoBounds,
    /// Reports ordered by observation time.
    pub reports: Vec<HailReport>,
    /// Data source label (e.g. `"mrms"`, `"spc"`).
    pub source: String,
}

impl StormEvent {
    /// Builds an enabled storm from its reports, sorting them by time.
    ///
    /// Returns `None` when `reports` is empty.
    #[must_use]
    pub fn from_reports(
        name: impl Into<String>,
        source: impl Into<String>,
        mut reports: Vec<HailReport>,
    ) -> Option<Self> {
        reports.sort_by_key(HailReport::observed_at);
        let started_at = reports.first()?.observed_at();
        let bounds = GeoBounds::from_reports(&reports)?;
        Some(Self {
            id: StormId::new(),
            name: name.into(),
            started_at,
            enabled: true,
            bounds,
            reports,
            source: source.into(),
        })
    }

    /// Largest reported hail size in inches.
    #[must_use]
    pub fn max_size_in(&self) -> f64 {
        self.reports
            .iter()
            .map(HailReport::size_in)
            .fold(0.0, f64::max)
    }
}

/// Lightweight summary of a storm for list endpoints and map messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StormSummary {
    /// Storm identifier.
    pub id: StormId,
    /// Display name.
    pub name: String,
    /// Time of the earliest report.
    pub started_at: DateTime<Utc>,
    /// Whether the storm is enabled.
    pub enabled: bool,
    /// Bounds of all reports.
    pub bounds: GeoBounds,
    /// Number of reports.
    pub report_count: usize,
    /// Largest hail size in inches.
    pub max_size_in: f64,
    /// Data source label.
    pub source: String,
}

impl From<&StormEvent> for StormSummary {
    fn from(storm: &StormEvent) -> Self {
        Self {
            id: storm.id,
            name: storm.name.clone(),
            started_at: storm.started_at,
            enabled: storm.enabled,
            bounds: storm.bounds,
            report_count: storm.reports.len(),
            max_size_in: storm.max_size_in(),
            source: storm.source.clone(),
        }
    }
}
