//! Primary "smooth" generator: kernel density surface + marching squares.
//!
//! For each tier the surface sums weighted kernels of every report at or
//! above the tier threshold. Higher tiers sum a subset of the same
//! non-negative terms, so their superlevel sets nest inside lower ones.

use std::collections::HashSet;

use geo::Coord;

use super::ContourGenerator;
use super::geometry::{
    ContourFeature, ContourFeatureCollection, LatLng, LocalProjection, PolygonGeometry,
};
use super::isolines::level_polygons;
use super::simplify::refine;
use super::surface::{Grid, SurfaceParams, WeightedPoint};
use super::tiers::SeverityTable;
use crate::domain::{HailReport, partition_valid};
use crate::error::{ContourError, GenerationError};

/// Distinct locations required before interpolation is attempted.
pub const MIN_DISTINCT_POINTS: usize = 3;

/// Upper bound on Chaikin passes; each pass doubles a ring's vertices.
pub const MAX_SMOOTHING_PASSES: usize = 4;

/// Two projected points closer than this (km) to the line through the
/// extreme pair count as collinear.
const COLLINEAR_TOLERANCE_KM: f64 = 1e-6;

/// Parameters of the smooth generator.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothParams {
    /// Grid and kernel.
    pub surface: SurfaceParams,
    /// Density level traced as the tier boundary.
    pub level: f64,
    /// Chaikin smoothing passes per ring.
    pub smoothing_passes: usize,
    /// Simplification tolerance in km.
    pub simplify_tolerance_km: f64,
}

impl Default for SmoothParams {
    fn default() -> Self {
        Self {
            surface: SurfaceParams::default(),
            level: 0.4,
            smoothing_passes: 1,
            simplify_tolerance_km: 0.05,
        }
    }
}

/// Multi-band severity contours from interpolated report density.
#[derive(Debug, Clone)]
pub struct SmoothContourGenerator {
    table: SeverityTable,
    params: SmoothParams,
}

impl SmoothContourGenerator {
    /// Creates a generator over the given tier table.
    ///
    /// Smoothing passes above [`MAX_SMOOTHING_PASSES`] are lowered to it.
    #[must_use]
    pub fn new(table: SeverityTable, mut params: SmoothParams) -> Self {
        params.smoothing_passes = params.smoothing_passes.min(MAX_SMOOTHING_PASSES);
        Self { table, params }
    }

    fn run(&self, reports: &[HailReport]) -> Result<ContourFeatureCollection, GenerationError> {
        let (reports, _) = partition_valid(reports);
        check_distinct(&reports)?;

        let Some(projection) =
            LocalProjection::centred_on(reports.iter().map(|r| LatLng::new(r.lat(), r.lng())))
        else {
            return Err(GenerationError::InsufficientPoints {
                distinct: 0,
                required: MIN_DISTINCT_POINTS,
            });
        };
        let projected: Vec<Coord<f64>> = reports
            .iter()
            .map(|r| projection.project(LatLng::new(r.lat(), r.lng())))
            .collect();
        check_collinear(&projected)?;

        let base = Grid::covering(&projected, &self.params.surface)?;
        let mut features = Vec::new();
        for tier in self.table.tiers() {
            let weighted: Vec<WeightedPoint> = reports
                .iter()
                .zip(&projected)
                .filter(|(r, _)| tier.admits(r.size_in()))
                .map(|(r, at)| WeightedPoint {
                    at: *at,
                    weight: r.weight(),
                })
                .collect();
            if weighted.is_empty() {
                continue;
            }
            let mut grid = base.zeroed();
            grid.accumulate(&weighted, &self.params.surface);

            let polygons = level_polygons(&grid, self.params.level);
            let before = features.len();
            features.extend(
                polygons
                    .iter()
                    .filter_map(|p| {
                        refine(p, self.params.smoothing_passes, self.params.simplify_tolerance_km)
                    })
                    .map(|p| {
                        ContourFeature::new(
                            tier.properties(),
                            PolygonGeometry::from_projected(&p, &projection),
                        )
                    }),
            );
            tracing::trace!(
                level = tier.level,
                reports = weighted.len(),
                polygons = features.len() - before,
                "tier contoured"
            );
        }

        if features.is_empty() {
            return Err(GenerationError::EmptySurface);
        }
        Ok(ContourFeatureCollection::new(features))
    }
}

impl ContourGenerator for SmoothContourGenerator {
    fn name(&self) -> &'static str {
        "smooth"
    }

    fn generate(&self, reports: &[HailReport]) -> Result<ContourFeatureCollection, ContourError> {
        Ok(self.run(reports)?)
    }
}

fn check_distinct(reports: &[HailReport]) -> Result<(), GenerationError> {
    // Micro-degree keys: ~10 cm, well below any meaningful separation.
    let distinct: HashSet<(i64, i64)> = reports
        .iter()
        .map(|r| {
            (
                (r.lat() * 1e6).round() as i64,
                (r.lng() * 1e6).round() as i64,
            )
        })
        .collect();
    if distinct.len() < MIN_DISTINCT_POINTS {
        return Err(GenerationError::InsufficientPoints {
            distinct: distinct.len(),
            required: MIN_DISTINCT_POINTS,
        });
    }
    Ok(())
}

fn check_collinear(points: &[Coord<f64>]) -> Result<(), GenerationError> {
    let Some(&a) = points.first() else {
        return Err(GenerationError::Degenerate);
    };
    let dist2 = |p: &Coord<f64>| (p.x - a.x).powi(2) + (p.y - a.y).powi(2);
    let Some(&b) = points.iter().max_by(|p, q| dist2(p).total_cmp(&dist2(q))) else {
        return Err(GenerationError::Degenerate);
    };
    let len = dist2(&b).sqrt();
    if len <= COLLINEAR_TOLERANCE_KM {
        return Err(GenerationError::Degenerate);
    }
    let off_line = points.iter().any(|p| {
        let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
        (cross / len).abs() > COLLINEAR_TOLERANCE_KM
    });
    if off_line {
        Ok(())
    } else {
        Err(GenerationError::Degenerate)
    }
}
