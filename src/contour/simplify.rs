//! Smoothing and simplification of raw isoline polygons.

use geo::orient::{Direction, Orient};
use geo::{
    Area, ChaikinSmoothing, Contains, Intersects, Line, LineString, Point, Polygon,
    SimplifyVwPreserve,
};

/// Smooths and simplifies a polygon, keeping it valid.
///
/// Vertices whose triangle with their neighbours is smaller than
/// `tolerance_km²` are removed. When the refined polygon is not simple,
/// the raw input is returned instead; `None` means even the input is not
/// a usable polygon.
#[must_use]
pub fn refine(
    polygon: &Polygon<f64>,
    smoothing_passes: usize,
    tolerance_km: f64,
) -> Option<Polygon<f64>> {
    let mut refined = if smoothing_passes > 0 {
        polygon.chaikin_smoothing(smoothing_passes)
    } else {
        polygon.clone()
    };
    if tolerance_km > 0.0 {
        refined = refined.simplify_vw_preserve(&(tolerance_km * tolerance_km));
    }
    let refined = refined.orient(Direction::Default);
    if is_valid(&refined) {
        return Some(refined);
    }
    tracing::debug!("refined contour invalid, keeping raw ring");
    is_valid(polygon).then(|| polygon.clone())
}

/// Closed, non-degenerate, non-self-intersecting rings with every hole
/// inside the exterior.
#[must_use]
pub fn is_valid(polygon: &Polygon<f64>) -> bool {
    let exterior = polygon.exterior();
    if !ring_is_simple(exterior) || polygon.unsigned_area() <= 0.0 {
        return false;
    }
    let shell = Polygon::new(exterior.clone(), vec![]);
    polygon.interiors().iter().all(|hole| {
        ring_is_simple(hole)
            && hole
                .coords()
                .next()
                .is_some_and(|c| shell.contains(&Point::from(*c)))
    })
}

/// Returns `true` for a closed ring of at least three distinct vertices
/// whose non-adjacent edges do not intersect.
#[must_use]
pub fn ring_is_simple(ring: &LineString<f64>) -> bool {
    if !ring.is_closed() || ring.0.len() < 4 {
        return false;
    }
    let edges: Vec<Line<f64>> = ring.lines().collect();
    let n = edges.len();
    for (i, a) in edges.iter().enumerate() {
        if a.start == a.end {
            return false;
        }
        for (j, b) in edges.iter().enumerate().skip(i + 2) {
            // First and last edges share the closing vertex.
            if i == 0 && j == n - 1 {
                continue;
            }
            if a.intersects(b) {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn circle(n: usize, r: f64) -> Polygon<f64> {
        let coords: Vec<(f64, f64)> = (0..n)
            .map(|i| {
                let a = i as f64 * std::f64::consts::TAU / n as f64;
                (r * a.cos(), r * a.sin())
            })
            .collect();
        Polygon::new(LineString::from(coords), vec![])
    }

    #[test]
    fn bowtie_is_not_simple() {
        let bowtie = LineString::from(vec![(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0), (0.0, 0.0)]);
        assert!(!ring_is_simple(&bowtie));
    }

    #[test]
    fn ring_touching_itself_is_not_simple() {
        // The fourth edge ends on the interior of the first.
        let pinched = LineString::from(vec![
            (0.0, 0.0),
            (4.0, 0.0),
            (4.0, 2.0),
            (2.0, 0.0),
            (0.0, 2.0),
            (0.0, 0.0),
        ]);
        assert!(!ring_is_simple(&pinched));
    }

    #[test]
    fn square_is_simple() {
        let square = LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]);
        assert!(ring_is_simple(&square));
    }

    #[test]
    fn refine_reduces_near_collinear_vertices() {
        let dense = circle(400, 10.0);
        let Some(refined) = refine(&dense, 0, 0.5) else {
            panic!("refined polygon expected");
        };
        assert!(refined.exterior().0.len() < dense.exterior().0.len());
        assert!(is_valid(&refined));
        let ratio = refined.unsigned_area() / dense.unsigned_area();
        assert!(ratio > 0.95 && ratio <= 1.0 + 1e-9);
    }

    #[test]
    fn refine_orients_exterior_ccw() {
        let cw = circle(32, 5.0).orient(Direction::Reversed);
        let Some(refined) = refine(&cw, 1, 0.01) else {
            panic!("refined polygon expected");
        };
        assert!(refined.signed_area() > 0.0);
    }

    #[test]
    fn degenerate_polygon_is_rejected() {
        let line = Polygon::new(LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]), vec![]);
        assert!(refine(&line, 0, 0.0).is_none());
    }
}
