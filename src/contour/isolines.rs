//! Marching squares isoline extraction and polygon assembly.
//!
//! Crossing points are keyed by the grid edge they lie on, so linking
//! segments into rings is a hash lookup rather than a coordinate search.
//! Saddle cells are resolved with the mean of their four corners, which
//! keeps rings at one level from touching each other.

use std::collections::HashMap;

use geo::orient::{Direction, Orient};
use geo::{Contains, Coord, LineString, Point, Polygon};

use super::surface::Grid;

/// Interpolation parameter kept strictly inside an edge so that no two
/// crossing points coincide on a shared node.
const EDGE_T_MIN: f64 = 1e-6;

/// Identity of a grid edge: horizontal edges run from `(col, row)` to
/// `(col + 1, row)`, vertical edges from `(col, row)` to `(col, row + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum EdgeId {
    Horizontal(usize, usize),
    Vertical(usize, usize),
}

impl EdgeId {
    fn endpoints(self) -> ((usize, usize), (usize, usize)) {
        match self {
            Self::Horizontal(c, r) => ((c, r), (c + 1, r)),
            Self::Vertical(c, r) => ((c, r), (c, r + 1)),
        }
    }
}

/// Cell corner flags: bit set when the corner is at or above the level.
const BL: u8 = 1;
const BR: u8 = 2;
const TR: u8 = 4;
const TL: u8 = 8;

/// Closed rings of the `level` isoline, in projected km.
///
/// Requires `level > 0` and a grid whose border nodes are zero.
#[must_use]
pub fn isoline_rings(grid: &Grid, level: f64) -> Vec<LineString<f64>> {
    let segments = march(grid, level);
    link(grid, level, &segments)
}

/// Superlevel-set polygons (`value >= level`) with holes, GeoJSON-oriented.
#[must_use]
pub fn level_polygons(grid: &Grid, level: f64) -> Vec<Polygon<f64>> {
    assemble(isoline_rings(grid, level))
}

fn march(grid: &Grid, level: f64) -> Vec<(EdgeId, EdgeId)> {
    let mut segments = Vec::new();
    for row in 0..grid.rows().saturating_sub(1) {
        for col in 0..grid.cols().saturating_sub(1) {
            let bl = grid.value(col, row);
            let br = grid.value(col + 1, row);
            let tr = grid.value(col + 1, row + 1);
            let tl = grid.value(col, row + 1);

            let mut case = 0;
            if bl >= level {
                case |= BL;
            }
            if br >= level {
                case |= BR;
            }
            if tr >= level {
                case |= TR;
            }
            if tl >= level {
                case |= TL;
            }

            let bottom = EdgeId::Horizontal(col, row);
            let top = EdgeId::Horizontal(col, row + 1);
            let left = EdgeId::Vertical(col, row);
            let right = EdgeId::Vertical(col + 1, row);
            let center_inside = (bl + br + tr + tl) / 4.0 >= level;

            match case {
                0 | 15 => {}
                1 | 14 => segments.push((left, bottom)),
                2 | 13 => segments.push((bottom, right)),
                3 | 12 => segments.push((left, right)),
                4 | 11 => segments.push((right, top)),
                6 | 9 => segments.push((bottom, top)),
                7 | 8 => segments.push((left, top)),
                5 => {
                    if center_inside {
                        segments.push((bottom, right));
                        segments.push((left, top));
                    } else {
                        segments.push((left, bottom));
                        segments.push((right, top));
                    }
                }
                10 => {
                    if center_inside {
                        segments.push((left, bottom));
                        segments.push((right, top));
                    } else {
                        segments.push((bottom, right));
                        segments.push((left, top));
                    }
                }
                _ => {}
            }
        }
    }
    segments
}

fn crossing(grid: &Grid, edge: EdgeId, level: f64) -> Coord<f64> {
    let ((c1, r1), (c2, r2)) = edge.endpoints();
    let (v1, v2) = (grid.value(c1, r1), grid.value(c2, r2));
    let t = if (v2 - v1).abs() < f64::EPSILON {
        0.5
    } else {
        ((level - v1) / (v2 - v1)).clamp(EDGE_T_MIN, 1.0 - EDGE_T_MIN)
    };
    let (a, b) = (grid.node(c1, r1), grid.node(c2, r2));
    Coord {
        x: a.x + t * (b.x - a.x),
        y: a.y + t * (b.y - a.y),
    }
}

fn link(grid: &Grid, level: f64, segments: &[(EdgeId, EdgeId)]) -> Vec<LineString<f64>> {
    let mut by_edge: HashMap<EdgeId, Vec<usize>> = HashMap::with_capacity(segments.len() * 2);
    for (i, (a, b)) in segments.iter().enumerate() {
        by_edge.entry(*a).or_default().push(i);
        by_edge.entry(*b).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut rings = Vec::new();
    for start in 0..segments.len() {
        if used.get(start).copied().unwrap_or(true) {
            continue;
        }
        let Some(&(first, mut cursor)) = segments.get(start) else {
            continue;
        };
        if let Some(u) = used.get_mut(start) {
            *u = true;
        }
        let mut edges = vec![first];
        let mut current = start;
        while cursor != first {
            edges.push(cursor);
            let next = by_edge
                .get(&cursor)
                .and_then(|ids| ids.iter().copied().find(|&i| i != current));
            let Some(next) = next else {
                // Open chain: cannot happen on a zero-bordered grid.
                break;
            };
            if used.get(next).copied().unwrap_or(true) {
                break;
            }
            if let Some(u) = used.get_mut(next) {
                *u = true;
            }
            let Some(&(a, b)) = segments.get(next) else {
                break;
            };
            cursor = if a == cursor { b } else { a };
            current = next;
        }
        if cursor != first || edges.len() < 3 {
            continue;
        }
        let mut coords: Vec<Coord<f64>> =
            edges.iter().map(|e| crossing(grid, *e, level)).collect();
        if let Some(c) = coords.first().copied() {
            coords.push(c);
        }
        rings.push(LineString::new(coords));
    }
    rings
}

/// Groups rings into polygons by containment depth: even depth is an
/// exterior, odd depth a hole of the exterior one level up.
fn assemble(rings: Vec<LineString<f64>>) -> Vec<Polygon<f64>> {
    let shells: Vec<Polygon<f64>> = rings
        .iter()
        .map(|r| Polygon::new(r.clone(), vec![]))
        .collect();
    let probe = |r: &LineString<f64>| r.coords().next().map(|c| Point::from(*c));

    let parents: Vec<Vec<usize>> = rings
        .iter()
        .enumerate()
        .map(|(i, ring)| {
            let Some(p) = probe(ring) else {
                return Vec::new();
            };
            shells
                .iter()
                .enumerate()
                .filter(|(j, shell)| *j != i && shell.contains(&p))
                .map(|(j, _)| j)
                .collect()
        })
        .collect();
    let depth = |i: usize| parents.get(i).map_or(0, Vec::len);

    let mut exteriors: Vec<(usize, Vec<LineString<f64>>)> = (0..rings.len())
        .filter(|&i| depth(i) % 2 == 0)
        .map(|i| (i, Vec::new()))
        .collect();
    for (i, ring) in rings.iter().enumerate() {
        let d = depth(i);
        if d % 2 == 0 {
            continue;
        }
        let parent = parents
            .get(i)
            .and_then(|ps| ps.iter().copied().find(|&p| depth(p) + 1 == d));
        if let Some(parent) = parent
            && let Some((_, holes)) = exteriors.iter_mut().find(|(e, _)| *e == parent)
        {
            holes.push(ring.clone());
        }
    }

    exteriors
        .into_iter()
        .filter_map(|(i, holes)| {
            rings
                .get(i)
                .map(|ext| Polygon::new(ext.clone(), holes).orient(Direction::Default))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::contour::surface::{SurfaceParams, WeightedPoint};
    use geo::Area;

    fn grid_with(points: &[(f64, f64)]) -> Grid {
        let params = SurfaceParams::default();
        let coords: Vec<Coord<f64>> = points.iter().map(|&(x, y)| Coord { x, y }).collect();
        let Ok(mut grid) = Grid::covering(&coords, &params) else {
            panic!("grid expected");
        };
        let weighted: Vec<WeightedPoint> = coords
            .iter()
            .map(|c| WeightedPoint { at: *c, weight: 1.0 })
            .collect();
        grid.accumulate(&weighted, &params);
        grid
    }

    #[test]
    fn single_peak_yields_one_closed_ccw_ring() {
        let grid = grid_with(&[(0.0, 0.0)]);
        let polygons = level_polygons(&grid, 0.4);
        assert_eq!(polygons.len(), 1);
        let Some(poly) = polygons.first() else {
            panic!("polygon expected");
        };
        assert!(poly.exterior().is_closed());
        assert!(poly.signed_area() > 0.0);
        assert!(poly.contains(&Point::new(0.0, 0.0)));
        assert!(!poly.contains(&Point::new(6.0, 0.0)));
    }

    #[test]
    fn separated_peaks_yield_separate_polygons() {
        let grid = grid_with(&[(0.0, 0.0), (40.0, 0.0)]);
        let polygons = level_polygons(&grid, 0.4);
        assert_eq!(polygons.len(), 2);
    }

    #[test]
    fn ring_of_points_produces_hole() {
        let points: Vec<(f64, f64)> = (0..36)
            .map(|i| {
                let a = f64::from(i) * std::f64::consts::TAU / 36.0;
                (20.0 * a.cos(), 20.0 * a.sin())
            })
            .collect();
        let grid = grid_with(&points);
        let polygons = level_polygons(&grid, 0.4);
        assert_eq!(polygons.len(), 1);
        let Some(poly) = polygons.first() else {
            panic!("polygon expected");
        };
        assert_eq!(poly.interiors().len(), 1);
        assert!(!poly.contains(&Point::new(0.0, 0.0)));
        assert!(poly.contains(&Point::new(20.0, 0.0)));
    }

    #[test]
    fn level_above_peak_yields_nothing() {
        let grid = grid_with(&[(0.0, 0.0)]);
        assert!(isoline_rings(&grid, 5.0).is_empty());
    }
}
