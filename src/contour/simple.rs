//! Fallback "simple" generator: buffered convex hulls per report cluster.
//!
//! Cheap and total. Any non-empty set of valid reports yields at least
//! one polygon: a single report becomes a circle, two or collinear reports
//! a stadium. Hulls are convex, so rings never self-intersect.

use std::collections::HashMap;

use geo::orient::{Direction, Orient};
use geo::{ConvexHull, Coord, LineString, MultiPoint, Point, Polygon};

use super::ContourGenerator;
use super::geometry::{
    ContourFeature, ContourFeatureCollection, LatLng, LocalProjection, PolygonGeometry,
};
use super::tiers::SeverityTable;
use crate::domain::{HailReport, partition_valid};
use crate::error::{ContourError, FallbackFailure};

/// Parameters of the simple generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimpleParams {
    /// Buffer radius around each report in km.
    pub buffer_km: f64,
    /// Vertices used to approximate each buffer circle.
    pub circle_segments: usize,
}

impl Default for SimpleParams {
    fn default() -> Self {
        Self {
            buffer_km: 3.0,
            circle_segments: 24,
        }
    }
}

/// Coarse severity polygons: one buffered hull per cluster per tier.
#[derive(Debug, Clone)]
pub struct SimpleContourGenerator {
    table: SeverityTable,
    params: SimpleParams,
}

impl SimpleContourGenerator {
    /// Creates a generator over the given tier table.
    ///
    /// Non-positive buffers and fewer than 8 circle segments are raised to
    /// usable minimums.
    #[must_use]
    pub fn new(table: SeverityTable, params: SimpleParams) -> Self {
        let params = SimpleParams {
            buffer_km: if params.buffer_km > 0.0 {
                params.buffer_km
            } else {
                SimpleParams::default().buffer_km
            },
            circle_segments: params.circle_segments.max(8),
        };
        Self { table, params }
    }

    /// Fails only when no valid report remains.
    fn run(&self, reports: &[HailReport]) -> Result<ContourFeatureCollection, FallbackFailure> {
        let (reports, _) = partition_valid(reports);
        let Some(projection) =
            LocalProjection::centred_on(reports.iter().map(|r| LatLng::new(r.lat(), r.lng())))
        else {
            return Err(FallbackFailure::EmptyInput);
        };

        let mut features = Vec::new();
        for tier in self.table.tiers() {
            let points: Vec<Coord<f64>> = tier
                .qualifying(&reports)
                .into_iter()
                .map(|r| projection.project(LatLng::new(r.lat(), r.lng())))
                .collect();
            if points.is_empty() {
                continue;
            }
            for cluster in clusters(&points, 2.0 * self.params.buffer_km) {
                let centers: Vec<Coord<f64>> =
                    cluster.iter().filter_map(|&i| points.get(i)).copied().collect();
                let samples: Vec<Point<f64>> =
                    centers.iter().flat_map(|c| self.circle(*c)).collect();
                let hull = MultiPoint::new(samples).convex_hull();
                for outline in self.hull_or_circles(hull, &centers) {
                    features.push(ContourFeature::new(
                        tier.properties(),
                        PolygonGeometry::from_projected(&outline, &projection),
                    ));
                }
            }
        }
        Ok(ContourFeatureCollection::new(features))
    }

    /// The cluster hull, or one buffered circle per report when the hull
    /// collapsed.
    fn hull_or_circles(&self, hull: Polygon<f64>, centers: &[Coord<f64>]) -> Vec<Polygon<f64>> {
        if hull.exterior().0.len() >= 4 {
            return vec![hull.orient(Direction::Default)];
        }
        tracing::warn!(reports = centers.len(), "cluster hull collapsed, using report buffers");
        centers
            .iter()
            .map(|c| {
                let ring: LineString<f64> = self.circle(*c).map(Coord::from).collect();
                Polygon::new(ring, vec![]).orient(Direction::Default)
            })
            .filter(|p| p.exterior().0.len() >= 4)
            .collect()
    }

    fn circle(&self, center: Coord<f64>) -> impl Iterator<Item = Point<f64>> + '_ {
        let n = self.params.circle_segments;
        let r = self.params.buffer_km;
        (0..n).map(move |i| {
            let a = i as f64 * std::f64::consts::TAU / n as f64;
            Point::new(center.x + r * a.cos(), center.y + r * a.sin())
        })
    }
}

impl ContourGenerator for SimpleContourGenerator {
    fn name(&self) -> &'static str {
        "simple"
    }

    fn generate(&self, reports: &[HailReport]) -> Result<ContourFeatureCollection, ContourError> {
        Ok(self.run(reports)?)
    }
}

/// Single-linkage clusters of points within `link_km` of each other.
///
/// Uses a spatial hash with `link_km` cells, so each point only checks its
/// own and neighbouring cells.
fn clusters(points: &[Coord<f64>], link_km: f64) -> Vec<Vec<usize>> {
    let cell_of = |c: &Coord<f64>| ((c.x / link_km).floor() as i64, (c.y / link_km).floor() as i64);
    let mut buckets: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (i, p) in points.iter().enumerate() {
        buckets.entry(cell_of(p)).or_default().push(i);
    }

    let mut sets = DisjointSet::new(points.len());
    let link2 = link_km * link_km;
    for (i, p) in points.iter().enumerate() {
        let (cx, cy) = cell_of(p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(bucket) = buckets.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for &j in bucket.iter().filter(|&&j| j > i) {
                    let Some(q) = points.get(j) else {
                        continue;
                    };
                    if (p.x - q.x).powi(2) + (p.y - q.y).powi(2) <= link2 {
                        sets.union(i, j);
                    }
                }
            }
        }
    }

    let mut groups: HashMap<usize, Vec<usize>> = HashMap::new();
    for i in 0..points.len() {
        groups.entry(sets.find(i)).or_default().push(i);
    }
    let mut out: Vec<Vec<usize>> = groups.into_values().collect();
    out.sort_by_key(|g| g.first().copied());
    out
}

/// Union-find with path halving.
#[derive(Debug)]
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while let Some(&p) = self.parent.get(i) {
            if p == i {
                break;
            }
            let grand = self.parent.get(p).copied().unwrap_or(p);
            if let Some(slot) = self.parent.get_mut(i) {
                *slot = grand;
            }
            i = grand;
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb
            && let Some(slot) = self.parent.get_mut(ra.max(rb))
        {
            *slot = ra.min(rb);
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::contour::test_support::two_cluster_reports;
    use chrono::Utc;

    fn generator() -> SimpleContourGenerator {
        SimpleContourGenerator::new(SeverityTable::default(), SimpleParams::default())
    }

    #[test]
    fn single_point_yields_circle() {
        let report = HailReport::new(35.0, -97.0, 1.25, Utc::now());
        let Ok(fc) = generator().generate(&[report]) else {
            panic!("fallback must not fail");
        };
        // Tier 0 and tier 1 each get one circle.
        assert_eq!(fc.len(), 2);
        assert!(fc.covers(1, LatLng::new(35.0, -97.0)));
        assert!(!fc.covers(2, LatLng::new(35.0, -97.0)));
        let Some(ring) = fc.features.first().and_then(|f| f.geometry.coordinates.first()) else {
            panic!("ring expected");
        };
        assert_eq!(ring.len(), 25);
    }

    #[test]
    fn collinear_points_yield_stadium() {
        let now = Utc::now();
        let reports: Vec<HailReport> = (0..4)
            .map(|i| HailReport::new(35.0 + f64::from(i) * 0.02, -97.0, 0.75, now))
            .collect();
        let Ok(fc) = generator().generate(&reports) else {
            panic!("fallback must not fail");
        };
        assert_eq!(fc.len(), 1);
        assert!(fc.covers(0, LatLng::new(35.03, -97.0)));
    }

    #[test]
    fn distant_clusters_stay_separate() {
        let (reports, centers) = two_cluster_reports();
        let Ok(fc) = generator().generate(&reports) else {
            panic!("fallback must not fail");
        };
        assert_eq!(fc.at_level(1).count(), 2);
        for center in centers {
            assert!(fc.covers(1, center));
        }
        let midpoint = LatLng::new(35.4, -97.125);
        assert!(!fc.covers(0, midpoint));
    }

    #[test]
    fn empty_input_is_the_only_failure() {
        assert_eq!(
            generator().generate(&[]),
            Err(ContourError::Fallback(FallbackFailure::EmptyInput))
        );
        let malformed = HailReport::new(f64::NAN, -97.0, 1.0, Utc::now());
        assert!(generator().generate(&[malformed]).is_err());
    }

    #[test]
    fn collapsed_hull_becomes_report_buffers() {
        let generator = generator();
        let centers = [Coord { x: 0.0, y: 0.0 }, Coord { x: 4.0, y: 0.0 }];
        let collapsed = Polygon::new(LineString::new(vec![]), vec![]);
        let outlines = generator.hull_or_circles(collapsed, &centers);
        assert_eq!(outlines.len(), 2);
        for (outline, center) in outlines.iter().zip(centers) {
            assert_eq!(outline.exterior().0.len(), 25);
            assert!(geo::Contains::contains(outline, &Point::from(center)));
        }
    }

    #[test]
    fn intact_hull_is_kept() {
        let generator = generator();
        let center = Coord { x: 0.0, y: 0.0 };
        let samples: Vec<Point<f64>> = generator.circle(center).collect();
        let hull = MultiPoint::new(samples).convex_hull();
        let outlines = generator.hull_or_circles(hull, &[center]);
        assert_eq!(outlines.len(), 1);
    }

    #[test]
    fn clusters_link_transitively() {
        let points = [
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 5.0, y: 0.0 },
            Coord { x: 10.0, y: 0.0 },
            Coord { x: 50.0, y: 0.0 },
        ];
        let groups = clusters(&points, 6.0);
        assert_eq!(groups, vec![vec![0, 1, 2], vec![3]]);
    }
}
