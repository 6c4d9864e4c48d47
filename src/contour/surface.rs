//! Kernel density surface on a regular grid.
//!
//! The grid covers the report extent padded by more than the kernel radius,
//! so every border node is exactly zero and isolines extracted from it are
//! always closed.

use std::str::FromStr;

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// Smoothing kernel used to spread a report over nearby grid nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kernel {
    /// `(1 - (d/r)²)²` inside the radius, zero outside.
    #[default]
    Biweight,
    /// Gaussian with σ = r/2, truncated at the radius.
    Gaussian,
}

impl Kernel {
    /// Kernel value at distance `d` for radius `radius`, in `[0, 1]`.
    #[must_use]
    pub fn weight(self, d: f64, radius: f64) -> f64 {
        if d >= radius || radius <= 0.0 {
            return 0.0;
        }
        match self {
            Self::Biweight => {
                let u = d / radius;
                (1.0 - u * u).powi(2)
            }
            Self::Gaussian => {
                let sigma = radius / 2.0;
                (-(d * d) / (2.0 * sigma * sigma)).exp()
            }
        }
    }
}

impl FromStr for Kernel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "biweight" => Ok(Self::Biweight),
            "gaussian" => Ok(Self::Gaussian),
            other => Err(format!("unknown kernel: {other}")),
        }
    }
}

/// Grid and kernel parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceParams {
    /// Kernel radius in km.
    pub influence_radius_km: f64,
    /// Grid cells per kernel radius.
    pub cells_per_radius: u32,
    /// Maximum nodes per grid axis.
    pub max_grid_dim: usize,
    /// Kernel shape.
    pub kernel: Kernel,
}

impl Default for SurfaceParams {
    fn default() -> Self {
        Self {
            influence_radius_km: 6.0,
            cells_per_radius: 4,
            max_grid_dim: 512,
            kernel: Kernel::Biweight,
        }
    }
}

impl SurfaceParams {
    /// Grid spacing in km.
    #[must_use]
    pub fn cell_km(&self) -> f64 {
        self.influence_radius_km / f64::from(self.cells_per_radius.max(1))
    }
}

/// A weighted sample in projected km.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedPoint {
    /// Projected position.
    pub at: Coord<f64>,
    /// Weight in `(0, 1]`.
    pub weight: f64,
}

/// Row-major scalar grid; node `(col, row)` sits at
/// `origin + (col, row) * cell`, rows increasing northward.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    origin: Coord<f64>,
    cell: f64,
    cols: usize,
    rows: usize,
    values: Vec<f64>,
}

impl Grid {
    /// Zeroed grid covering `points` with a border wider than the radius.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InsufficientPoints`] for empty input and
    /// [`GenerationError::GridTooLarge`] when either axis would exceed
    /// `params.max_grid_dim`.
    pub fn covering(points: &[Coord<f64>], params: &SurfaceParams) -> Result<Self, GenerationError> {
        let Some(first) = points.first() else {
            return Err(GenerationError::InsufficientPoints {
                distinct: 0,
                required: 1,
            });
        };
        let (mut min, mut max) = (*first, *first);
        for p in points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        let cell = params.cell_km();
        let pad = params.influence_radius_km + 2.0 * cell;
        let origin = Coord {
            x: min.x - pad,
            y: min.y - pad,
        };
        let span_x = max.x - min.x + 2.0 * pad;
        let span_y = max.y - min.y + 2.0 * pad;
        let cols = axis_nodes(span_x, cell);
        let rows = axis_nodes(span_y, cell);
        if cols > params.max_grid_dim || rows > params.max_grid_dim {
            return Err(GenerationError::GridTooLarge {
                cols,
                rows,
                limit: params.max_grid_dim,
            });
        }
        Ok(Self {
            origin,
            cell,
            cols,
            rows,
            values: vec![0.0; cols.saturating_mul(rows)],
        })
    }

    /// Same geometry with every node reset to zero.
    #[must_use]
    pub fn zeroed(&self) -> Self {
        Self {
            values: vec![0.0; self.values.len()],
            ..self.clone()
        }
    }

    /// Sums kernel-weighted contributions of `points` into the grid.
    pub fn accumulate(&mut self, points: &[WeightedPoint], params: &SurfaceParams) {
        let radius = params.influence_radius_km;
        let reach = (radius / self.cell).ceil() as isize;
        for p in points {
            let c0 = ((p.at.x - self.origin.x) / self.cell).round() as isize;
            let r0 = ((p.at.y - self.origin.y) / self.cell).round() as isize;
            for row in (r0 - reach).max(0)..=(r0 + reach) {
                for col in (c0 - reach).max(0)..=(c0 + reach) {
                    let (Ok(col), Ok(row)) = (usize::try_from(col), usize::try_from(row)) else {
                        continue;
                    };
                    if col >= self.cols || row >= self.rows {
                        continue;
                    }
                    let node = self.node(col, row);
                    let d = ((node.x - p.at.x).powi(2) + (node.y - p.at.y).powi(2)).sqrt();
                    let w = params.kernel.weight(d, radius) * p.weight;
                    if w > 0.0
                        && let Some(v) = self.values.get_mut(row * self.cols + col)
                    {
                        *v += w;
                    }
                }
            }
        }
    }

    /// Value at a node; zero outside the grid.
    #[must_use]
    pub fn value(&self, col: usize, row: usize) -> f64 {
        if col >= self.cols || row >= self.rows {
            return 0.0;
        }
        self.values
            .get(row * self.cols + col)
            .copied()
            .unwrap_or(0.0)
    }

    /// Projected position of a node.
    #[must_use]
    pub fn node(&self, col: usize, row: usize) -> Coord<f64> {
        Coord {
            x: self.origin.x + col as f64 * self.cell,
            y: self.origin.y + row as f64 * self.cell,
        }
    }

    /// Number of node columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Number of node rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Largest node value.
    #[must_use]
    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }
}

fn axis_nodes(span: f64, cell: f64) -> usize {
    // Saturating float-to-int cast; huge spans are caught by the grid limit.
    (span / cell).ceil() as usize + 1
}
