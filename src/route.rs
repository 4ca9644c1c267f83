//! Route metrics and waypoint normalization.
//!
//! A route is an ordered slice of [`Coordinate`]s from the trip's origin to
//! its destination. Distance and duration are estimated from great-circle
//! segment lengths and an assumed average speed; there is no road network
//! behind these numbers.

use serde::{Deserialize, Serialize};

use crate::geo::{Coordinate, haversine_distance_km, point_to_segment_distance_meters};

/// Points closer than this (degrees, per axis) are treated as duplicates.
const DUPLICATE_EPSILON_DEGREES: f64 = 1e-6;

/// Derived totals for a route at an assumed speed. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteMetrics {
    pub total_distance_km: f64,
    pub total_duration_minutes: f64,
}

impl RouteMetrics {
    pub fn zero() -> Self {
        Self {
            total_distance_km: 0.0,
            total_duration_minutes: 0.0,
        }
    }
}

/// Sum segment distances and convert to minutes at the given speed.
///
/// The speed is floored at 1 km/h so pathological input (zero or negative)
/// cannot blow up the division. Routes with fewer than 2 points have zero
/// metrics.
pub fn estimate_route_metrics(route: &[Coordinate], average_speed_kmh: f64) -> RouteMetrics {
    if route.len() < 2 {
        return RouteMetrics::zero();
    }

    let total_distance_km: f64 = route
        .windows(2)
        .map(|pair| haversine_distance_km(pair[0], pair[1]))
        .sum();

    let speed = average_speed_kmh.max(1.0);
    RouteMetrics {
        total_distance_km,
        total_duration_minutes: total_distance_km / speed * 60.0,
    }
}

/// Collapse consecutive points that differ by at most 1e-6 degrees on both
/// axes. Order is preserved and the first point is always kept.
pub fn remove_consecutive_duplicates(route: &[Coordinate]) -> Vec<Coordinate> {
    let mut deduped: Vec<Coordinate> = Vec::with_capacity(route.len());

    for point in route {
        match deduped.last() {
            Some(previous)
                if (point.latitude - previous.latitude).abs() <= DUPLICATE_EPSILON_DEGREES
                    && (point.longitude - previous.longitude).abs()
                        <= DUPLICATE_EPSILON_DEGREES => {}
            _ => deduped.push(*point),
        }
    }

    deduped
}

/// Minimum distance in meters from a point to any segment of the route.
///
/// A single-point route degenerates to the distance to that point. Returns
/// infinity for an empty route.
pub fn min_distance_to_route_meters(point: Coordinate, route: &[Coordinate]) -> f64 {
    match route.len() {
        0 => f64::INFINITY,
        1 => haversine_distance_km(point, route[0]) * 1000.0,
        _ => route
            .windows(2)
            .map(|pair| point_to_segment_distance_meters(point, pair[0], pair[1]))
            .fold(f64::INFINITY, f64::min),
    }
}
