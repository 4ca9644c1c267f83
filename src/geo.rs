//! Geometry primitives for route matching.
//!
//! Great-circle distance, a local flat-plane projection, point-to-segment
//! distance, and bounding boxes. All functions here are pure and assume
//! coordinates are already range-checked by callers; validation happens at
//! the API boundary, not in the hot path.

use serde::{Deserialize, Serialize};

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Meters per degree of latitude.
const METERS_PER_DEGREE_LAT: f64 = 111_132.0;

/// Meters per degree of longitude at the equator.
const METERS_PER_DEGREE_LON: f64 = 111_320.0;

/// A geographic point in degrees.
///
/// Valid coordinates have latitude in [-90, 90] and longitude in
/// [-180, 180]; use [`Coordinate::is_valid`] at API boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether this coordinate is within valid degree ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Great-circle distance between two points in kilometers (haversine).
///
/// The intermediate square root argument is clamped to [0, 1] so identical
/// or antipodal points cannot produce NaN through floating-point overshoot.
pub fn haversine_distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.clamp(0.0, 1.0).sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Project a point into a local flat plane (meters) around a reference
/// latitude, using an equirectangular approximation.
///
/// Accurate only for short distances (tens of km) — fine for intra-city
/// matching, wrong for continental routes. The longitude scale is
/// `111,320 * cos(reference_latitude)` meters per degree.
pub fn project_to_meters(point: Coordinate, reference_latitude: f64) -> (f64, f64) {
    let x = point.longitude * METERS_PER_DEGREE_LON * reference_latitude.to_radians().cos();
    let y = point.latitude * METERS_PER_DEGREE_LAT;
    (x, y)
}

/// Minimum distance in meters from a point to the segment [a, b].
///
/// Works in the local meter plane around the segment midpoint latitude,
/// with the projection scalar clamped to [0, 1] so the closest point stays
/// on the segment. A degenerate segment (a == b in the plane) falls back to
/// haversine distance to the single location.
pub fn point_to_segment_distance_meters(
    point: Coordinate,
    segment_start: Coordinate,
    segment_end: Coordinate,
) -> f64 {
    let reference_latitude = (segment_start.latitude + segment_end.latitude) / 2.0;

    let (px, py) = project_to_meters(point, reference_latitude);
    let (ax, ay) = project_to_meters(segment_start, reference_latitude);
    let (bx, by) = project_to_meters(segment_end, reference_latitude);

    let dx = bx - ax;
    let dy = by - ay;
    let length_squared = dx * dx + dy * dy;

    if length_squared == 0.0 {
        return haversine_distance_km(point, segment_start) * 1000.0;
    }

    let t = (((px - ax) * dx + (py - ay) * dy) / length_squared).clamp(0.0, 1.0);
    let closest_x = ax + t * dx;
    let closest_y = ay + t * dy;

    ((px - closest_x).powi(2) + (py - closest_y).powi(2)).sqrt()
}

/// Axis-aligned bounding box over coordinates, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    /// Expand every side by a margin given in meters, converted to degrees
    /// with the same local-projection constants used elsewhere.
    pub fn expanded_by_meters(&self, meters: f64) -> Self {
        let lat_margin = meters / METERS_PER_DEGREE_LAT;
        let mid_latitude = (self.min_latitude + self.max_latitude) / 2.0;
        let lon_scale = METERS_PER_DEGREE_LON * mid_latitude.to_radians().cos();
        let lon_margin = if lon_scale > 0.0 {
            meters / lon_scale
        } else {
            0.0
        };

        Self {
            min_latitude: self.min_latitude - lat_margin,
            max_latitude: self.max_latitude + lat_margin,
            min_longitude: self.min_longitude - lon_margin,
            max_longitude: self.max_longitude + lon_margin,
        }
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        point.latitude >= self.min_latitude
            && point.latitude <= self.max_latitude
            && point.longitude >= self.min_longitude
            && point.longitude <= self.max_longitude
    }
}

/// Bounding box of a route, or None for an empty route.
///
/// Cheap pre-filter for callers pruning candidates before exact
/// point-to-route distances; the evaluator itself does not use it.
pub fn route_bounding_box(route: &[Coordinate]) -> Option<BoundingBox> {
    let first = route.first()?;
    let mut bbox = BoundingBox {
        min_latitude: first.latitude,
        max_latitude: first.latitude,
        min_longitude: first.longitude,
        max_longitude: first.longitude,
    };

    for point in &route[1..] {
        bbox.min_latitude = bbox.min_latitude.min(point.latitude);
        bbox.max_latitude = bbox.max_latitude.max(point.latitude);
        bbox.min_longitude = bbox.min_longitude.min(point.longitude);
        bbox.max_longitude = bbox.max_longitude.max(point.longitude);
    }

    Some(bbox)
}
