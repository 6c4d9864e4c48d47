//! GeoJSON-shaped contour output and the local planar projection.
//!
//! Generators work in kilometres on a local equirectangular projection
//! centred on the input. At storm scale (tens to hundreds of km) the
//! distortion is well under the grid resolution.

use geo::{Contains, Coord, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

const KM_PER_DEG_LAT: f64 = 110.574;
const KM_PER_DEG_LNG_EQUATOR: f64 = 111.320;

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl LatLng {
    /// Creates a position.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Great-circle distance between two positions in kilometres.
#[must_use]
pub fn haversine_km(a: LatLng, b: LatLng) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = lat2 - lat1;
    let dlng = (b.lng - a.lng).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Equirectangular projection to kilometres around an origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalProjection {
    origin: LatLng,
    km_per_deg_lng: f64,
}

impl LocalProjection {
    /// Projection centred on `origin`.
    #[must_use]
    pub fn new(origin: LatLng) -> Self {
        // Clamp near the poles so the inverse stays finite.
        let cos = origin.lat.to_radians().cos().max(0.01);
        Self {
            origin,
            km_per_deg_lng: KM_PER_DEG_LNG_EQUATOR * cos,
        }
    }

    /// Projection centred on the mean of `points`, or `None` when empty.
    #[must_use]
    pub fn centred_on(points: impl IntoIterator<Item = LatLng>) -> Option<Self> {
        let (mut lat, mut lng, mut n) = (0.0, 0.0, 0_u32);
        for p in points {
            lat += p.lat;
            lng += p.lng;
            n = n.saturating_add(1);
        }
        if n == 0 {
            return None;
        }
        let n = f64::from(n);
        Some(Self::new(LatLng::new(lat / n, lng / n)))
    }

    /// Projects a position to local km (`x` east, `y` north).
    #[must_use]
    pub fn project(&self, p: LatLng) -> Coord<f64> {
        Coord {
            x: (p.lng - self.origin.lng) * self.km_per_deg_lng,
            y: (p.lat - self.origin.lat) * KM_PER_DEG_LAT,
        }
    }

    /// Inverse of [`Self::project`].
    #[must_use]
    pub fn unproject(&self, c: Coord<f64>) -> LatLng {
        LatLng {
            lat: self.origin.lat + c.y / KM_PER_DEG_LAT,
            lng: self.origin.lng + c.x / self.km_per_deg_lng,
        }
    }
}

/// GeoJSON object type tag for a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollectionType {
    /// `"FeatureCollection"`.
    #[default]
    FeatureCollection,
}

/// GeoJSON object type tag for a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FeatureType {
    /// `"Feature"`.
    #[default]
    Feature,
}

/// GeoJSON geometry type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GeometryType {
    /// `"Polygon"`.
    #[default]
    Polygon,
}

/// A GeoJSON polygon: closed rings of `[lng, lat]` positions.
///
/// The first ring is the exterior (counter-clockwise), any further rings
/// are holes (clockwise).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonGeometry {
    /// Always [`GeometryType::Polygon`].
    #[serde(rename = "type")]
    pub kind: GeometryType,
    /// Rings of `[lng, lat]` positions, each closed.
    pub coordinates: Vec<Vec<[f64; 2]>>,
}

impl PolygonGeometry {
    /// Converts a projected polygon back to geographic coordinates.
    #[must_use]
    pub fn from_projected(polygon: &Polygon<f64>, projection: &LocalProjection) -> Self {
        let ring = |ls: &LineString<f64>| -> Vec<[f64; 2]> {
            let mut out: Vec<[f64; 2]> = ls
                .coords()
                .map(|c| {
                    let p = projection.unproject(*c);
                    [p.lng, p.lat]
                })
                .collect();
            if out.first() != out.last() {
                if let Some(first) = out.first().copied() {
                    out.push(first);
                }
            }
            out
        };
        let mut coordinates = Vec::with_capacity(1 + polygon.interiors().len());
        coordinates.push(ring(polygon.exterior()));
        coordinates.extend(polygon.interiors().iter().map(ring));
        Self {
            kind: GeometryType::Polygon,
            coordinates,
        }
    }

    /// Exterior ring as lat/lng positions (closing position included).
    #[must_use]
    pub fn exterior(&self) -> Vec<LatLng> {
        self.coordinates
            .first()
            .map(|ring| ring.iter().map(|[lng, lat]| LatLng::new(*lat, *lng)).collect())
            .unwrap_or_default()
    }

    /// Returns `true` if `p` lies inside the exterior and outside every hole.
    #[must_use]
    pub fn contains(&self, p: LatLng) -> bool {
        let mut rings = self.coordinates.iter().map(|ring| {
            ring.iter()
                .map(|[lng, lat]| Coord { x: *lng, y: *lat })
                .collect::<LineString<f64>>()
        });
        let Some(exterior) = rings.next() else {
            return false;
        };
        Polygon::new(exterior, rings.collect()).contains(&Point::new(p.lng, p.lat))
    }
}

/// Severity metadata attached to every contour feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourProperties {
    /// Ordinal severity tier (0 = lowest).
    pub level: u8,
    /// Human-readable tier label.
    pub label: String,
    /// Display color (`#rrggbb`).
    pub color: String,
    /// Lower hail-size bound of the tier in inches.
    pub threshold_in: f64,
}

/// One severity polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourFeature {
    /// Always [`FeatureType::Feature`].
    #[serde(rename = "type")]
    pub kind: FeatureType,
    /// Severity metadata.
    pub properties: ContourProperties,
    /// Polygon geometry.
    pub geometry: PolygonGeometry,
}

impl ContourFeature {
    /// Creates a feature.
    #[must_use]
    pub fn new(properties: ContourProperties, geometry: PolygonGeometry) -> Self {
        Self {
            kind: FeatureType::Feature,
            properties,
            geometry,
        }
    }
}

/// Output of a contour generator.
///
/// The empty collection is the canonical "no data" value; consumers clear
/// their overlay when they receive it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContourFeatureCollection {
    /// Always [`CollectionType::FeatureCollection`].
    #[serde(rename = "type")]
    pub kind: CollectionType,
    /// Severity polygons, ordered by ascending level.
    pub features: Vec<ContourFeature>,
}

impl ContourFeatureCollection {
    /// The canonical empty collection.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wraps features, sorting them by ascending level.
    #[must_use]
    pub fn new(mut features: Vec<ContourFeature>) -> Self {
        features.sort_by_key(|f| f.properties.level);
        Self {
            kind: CollectionType::FeatureCollection,
            features,
        }
    }

    /// Returns `true` if there are no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Features at the given level.
    pub fn at_level(&self, level: u8) -> impl Iterator<Item = &ContourFeature> {
        self.features
            .iter()
            .filter(move |f| f.properties.level == level)
    }

    /// Returns `true` if any feature at `level` contains `p`.
    #[must_use]
    pub fn covers(&self, level: u8, p: LatLng) -> bool {
        self.at_level(level).any(|f| f.geometry.contains(p))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn empty_collection_serializes_canonically() {
        let Ok(json) = serde_json::to_string(&ContourFeatureCollection::empty()) else {
            panic!("serialization failed");
        };
        assert_eq!(json, r#"{"type":"FeatureCollection","features":[]}"#);
    }

    #[test]
    fn projection_round_trip() {
        let proj = LocalProjection::new(LatLng::new(35.2, -97.4));
        let p = LatLng::new(35.35, -97.1);
        let back = proj.unproject(proj.project(p));
        assert!((back.lat - p.lat).abs() < 1e-9);
        assert!((back.lng - p.lng).abs() < 1e-9);
    }

    #[test]
    fn projection_distance_matches_haversine_at_storm_scale() {
        let a = LatLng::new(35.2, -97.4);
        let b = LatLng::new(35.4, -97.1);
        let proj = LocalProjection::new(a);
        let (pa, pb) = (proj.project(a), proj.project(b));
        let planar = ((pb.x - pa.x).powi(2) + (pb.y - pa.y).powi(2)).sqrt();
        let great_circle = haversine_km(a, b);
        assert!((planar - great_circle).abs() / great_circle < 0.01);
    }

    #[test]
    fn haversine_one_degree_latitude() {
        let d = haversine_km(LatLng::new(0.0, 0.0), LatLng::new(1.0, 0.0));
        assert!((d - 111.19).abs() < 0.1);
    }

    #[test]
    fn polygon_geometry_closes_rings_and_contains() {
        let proj = LocalProjection::new(LatLng::new(35.0, -97.0));
        let square = Polygon::new(
            LineString::from(vec![(-5.0, -5.0), (5.0, -5.0), (5.0, 5.0), (-5.0, 5.0)]),
            vec![],
        );
        let geom = PolygonGeometry::from_projected(&square, &proj);
        let Some(ring) = geom.coordinates.first() else {
            panic!("exterior expected");
        };
        assert_eq!(ring.first(), ring.last());
        assert!(geom.contains(LatLng::new(35.0, -97.0)));
        assert!(!geom.contains(LatLng::new(35.5, -97.0)));
    }

    #[test]
    fn points_inside_a_hole_are_not_contained() {
        let geom = PolygonGeometry {
            kind: GeometryType::Polygon,
            coordinates: vec![
                vec![[-98.0, 34.0], [-96.0, 34.0], [-96.0, 36.0], [-98.0, 36.0], [-98.0, 34.0]],
                vec![[-97.5, 34.5], [-97.5, 35.5], [-96.5, 35.5], [-96.5, 34.5], [-97.5, 34.5]],
            ],
        };
        assert!(geom.contains(LatLng::new(34.25, -97.0)));
        assert!(!geom.contains(LatLng::new(35.0, -97.0)));
        assert!(!geom.contains(LatLng::new(37.0, -97.0)));

        let no_rings = PolygonGeometry {
            kind: GeometryType::Polygon,
            coordinates: vec![],
        };
        assert!(!no_rings.contains(LatLng::new(35.0, -97.0)));
    }

    #[test]
    fn collection_sorts_by_level() {
        let geom = PolygonGeometry {
            kind: GeometryType::Polygon,
            coordinates: vec![],
        };
        let feature = |level: u8| {
            ContourFeature::new(
                ContourProperties {
                    level,
                    label: String::new(),
                    color: String::new(),
                    threshold_in: 0.0,
                },
                geom.clone(),
            )
        };
        let fc = ContourFeatureCollection::new(vec![feature(2), feature(0), feature(1)]);
        let levels: Vec<u8> = fc.features.iter().map(|f| f.properties.level).collect();
        assert_eq!(levels, vec![0, 1, 2]);
        assert_eq!(fc.at_level(1).count(), 1);
    }
}
