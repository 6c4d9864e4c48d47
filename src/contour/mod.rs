//! Contour generation: hail reports in, severity polygons out.
//!
//! Two strategies implement [`ContourGenerator`]:
//!
//! - [`SmoothContourGenerator`] interpolates a kernel density surface per
//!   severity tier and traces it with marching squares. Fails on sparse or
//!   degenerate input.
//! - [`SimpleContourGenerator`] draws a buffered convex hull around each
//!   cluster of reports per tier. Succeeds for any non-empty input.
//!
//! Neither strategy mutates its input.

pub mod geometry;
pub mod isolines;
pub mod simple;
pub mod simplify;
pub mod smooth;
pub mod surface;
pub mod tiers;

pub use geometry::{ContourFeature, ContourFeatureCollection, ContourProperties, LatLng};
pub use simple::{SimpleContourGenerator, SimpleParams};
pub use smooth::{SmoothContourGenerator, SmoothParams};
pub use surface::{Kernel, SurfaceParams};
pub use tiers::{SeverityTable, SeverityTier};

use crate::domain::HailReport;
use crate::error::ContourError;

/// A strategy that turns a report snapshot into severity polygons.
pub trait ContourGenerator: Send + Sync + std::fmt::Debug {
    /// Short strategy name used in logs and status responses.
    fn name(&self) -> &'static str;

    /// Generates contours for `reports`.
    ///
    /// # Errors
    ///
    /// Returns [`ContourError`] when the strategy cannot produce valid
    /// geometry for this input.
    fn generate(&self, reports: &[HailReport]) -> Result<ContourFeatureCollection, ContourError>;
}
