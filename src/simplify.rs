//! Route simplification (Douglas-Peucker).
//!
//! Persisted and returned waypoint sequences are simplified to keep payloads
//! bounded and, more importantly, to keep the insertion search cheap: the
//! evaluator is cubic in the waypoint count, so trimming a raw GPS trace to
//! tens of points is what makes it affordable.

use crate::geo::{Coordinate, point_to_segment_distance_meters};
use crate::route::remove_consecutive_duplicates;

/// Classic recursive Douglas-Peucker simplification.
///
/// Routes of length <= 2 are returned unchanged. Otherwise the point with
/// maximum perpendicular distance from the first-to-last chord either splits
/// the route into two recursively simplified halves (distance > epsilon) or
/// the whole route collapses to its endpoints.
pub fn douglas_peucker(route: &[Coordinate], epsilon_meters: f64) -> Vec<Coordinate> {
    if route.len() <= 2 {
        return route.to_vec();
    }

    let first = route[0];
    let last = route[route.len() - 1];

    let mut max_distance = 0.0;
    let mut max_index = 0;
    for (index, point) in route.iter().enumerate().skip(1).take(route.len() - 2) {
        let distance = point_to_segment_distance_meters(*point, first, last);
        if distance > max_distance {
            max_distance = distance;
            max_index = index;
        }
    }

    if max_distance <= epsilon_meters || max_index == 0 {
        return vec![first, last];
    }

    let mut left = douglas_peucker(&route[..=max_index], epsilon_meters);
    let right = douglas_peucker(&route[max_index..], epsilon_meters);

    // The split point appears at the end of `left` and the start of `right`
    left.pop();
    left.extend(right);
    left
}

/// Simplify a waypoint sequence, guaranteeing a minimum resolution.
///
/// Deduplication always runs; a zero tolerance means dedupe-only. When
/// Douglas-Peucker would drop below `minimum_points`, the deduplicated route
/// is truncated to `minimum_points` instead — callers depend on at least a
/// start+end pair surviving even aggressive tolerances.
pub fn simplify_route_waypoints(
    route: &[Coordinate],
    tolerance_meters: f64,
    minimum_points: usize,
) -> Vec<Coordinate> {
    let minimum_points = minimum_points.max(2);

    if route.len() <= minimum_points {
        return route.to_vec();
    }

    let deduped = remove_consecutive_duplicates(route);
    if deduped.len() <= minimum_points || tolerance_meters <= 0.0 {
        return deduped;
    }

    let simplified = douglas_peucker(&deduped, tolerance_meters);
    if simplified.len() < minimum_points {
        return deduped[..minimum_points].to_vec();
    }

    simplified
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_line(points: usize) -> Vec<Coordinate> {
        (0..points)
            .map(|i| Coordinate::new(0.0, i as f64 * 0.001))
            .collect()
    }

    #[test]
    fn short_routes_unchanged() {
        let route = vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0)];
        assert_eq!(douglas_peucker(&route, 100.0), route);
        assert_eq!(simplify_route_waypoints(&route, 100.0, 2), route);
    }

    #[test]
    fn straight_line_collapses_to_endpoints() {
        let route = straight_line(50);
        let simplified = douglas_peucker(&route, 10.0);
        assert_eq!(simplified.len(), 2);
        assert_eq!(simplified[0], route[0]);
        assert_eq!(simplified[1], route[49]);
    }

    #[test]
    fn spike_survives_simplification() {
        // 100 near-colinear points with a single ~500m spike at the midpoint
        let mut route = straight_line(100);
        route[50].latitude += 0.0045; // ~500m
        let spike = route[50];

        let simplified = simplify_route_waypoints(&route, 100.0, 2);
        assert!(simplified.len() < 100, "got {} points", simplified.len());
        assert!(
            simplified.contains(&spike),
            "spike point must survive a 100m tolerance"
        );
    }

    #[test]
    fn zero_tolerance_only_dedupes() {
        let route = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 0.001),
            Coordinate::new(0.0, 0.002),
        ];
        let simplified = simplify_route_waypoints(&route, 0.0, 2);
        assert_eq!(simplified.len(), 3);
    }

    #[test]
    fn minimum_points_floor_holds() {
        let route = straight_line(20);
        let simplified = simplify_route_waypoints(&route, 1e6, 5);
        assert_eq!(simplified.len(), 5);
    }

    #[test]
    fn idempotent_under_same_tolerance() {
        let mut route = straight_line(60);
        route[20].latitude += 0.003;
        route[40].latitude -= 0.002;

        let once = simplify_route_waypoints(&route, 50.0, 2);
        let twice = simplify_route_waypoints(&once, 50.0, 2);
        assert_eq!(once, twice);
    }
}
