//! Passenger insertion evaluator.
//!
//! Given a driver's planned route and a passenger's pickup/dropoff pair,
//! find the cheapest way to splice both stops into the route: every pickup
//! position is tried against every later dropoff position, candidates are
//! scored by added travel time, and the caller's detour caps bound what is
//! acceptable. Routes are small (tens of points, post-simplification), so
//! the exhaustive cubic scan is fine.

use serde::{Deserialize, Serialize};

use crate::error::MatchError;
use crate::geo::Coordinate;
use crate::route::{RouteMetrics, estimate_route_metrics, min_distance_to_route_meters};

/// Candidates within this many minutes of each other are considered tied,
/// so floating-point jitter cannot flip the selection. A candidate at or
/// below this cost is treated as free and ends the search.
const COST_EPSILON_MINUTES: f64 = 1e-3;

/// Distance tie-break tolerance in kilometers (~1 meter).
const DISTANCE_EPSILON_KM: f64 = 1e-3;

/// The two stops a passenger needs inserted into a driver's route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PassengerStops {
    pub pickup: Coordinate,
    pub dropoff: Coordinate,
}

/// Tuning for a single insertion evaluation.
#[derive(Debug, Clone, Copy)]
pub struct InsertionOptions {
    /// Assumed average driving speed in km/h.
    pub average_speed_kmh: f64,
    /// Hard cap on acceptable added travel time.
    pub max_additional_minutes: f64,
    /// Optional pre-filter: reject outright when either stop is farther
    /// than this from every segment of the original route.
    pub max_deviation_meters: Option<f64>,
}

impl InsertionOptions {
    /// Options with the default 30 km/h speed and no deviation cap.
    pub fn new(max_additional_minutes: f64) -> Self {
        Self {
            average_speed_kmh: 30.0,
            max_additional_minutes,
            max_deviation_meters: None,
        }
    }
}

/// The cheapest feasible insertion found for a pickup/dropoff pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentCandidate {
    /// Splice position of the pickup in the original route.
    pub pickup_insert_index: usize,
    /// Splice position of the dropoff, counted in the route that already
    /// contains the pickup (one longer than the original). Always strictly
    /// greater than `pickup_insert_index`.
    pub dropoff_insert_index: usize,
    pub additional_minutes: f64,
    pub additional_distance_km: f64,
    /// The route with both stops inserted. The input route is untouched.
    pub updated_route: Vec<Coordinate>,
    pub updated_metrics: RouteMetrics,
    pub base_metrics: RouteMetrics,
}

/// Presentation-friendly view of a candidate with percentage deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentSummary {
    pub pickup_insert_index: usize,
    pub dropoff_insert_index: usize,
    pub additional_minutes: f64,
    pub additional_distance_km: f64,
    pub additional_minutes_percent: f64,
    pub additional_distance_percent: f64,
    pub base_metrics: RouteMetrics,
    pub updated_metrics: RouteMetrics,
}

/// Find the minimum-cost insertion of a passenger's stops into a route.
///
/// Returns `Ok(None)` when no insertion satisfies the caps (infeasible is an
/// expected outcome, not an error). Fails only on the caller contract
/// violation of passing a route with fewer than 2 points.
///
/// Candidates are ranked by added minutes, tie-broken by added distance,
/// both with a small epsilon so near-equal candidates select stably. A
/// candidate costing <= 1e-3 minutes ends the search early; nothing cheaper
/// is geometrically possible.
pub fn evaluate_passenger_insertion(
    route: &[Coordinate],
    stops: &PassengerStops,
    options: &InsertionOptions,
) -> Result<Option<AssignmentCandidate>, MatchError> {
    if route.len() < 2 {
        return Err(MatchError::RouteTooShort {
            points: route.len(),
        });
    }

    let base_metrics = estimate_route_metrics(route, options.average_speed_kmh);

    if let Some(cap) = options.max_deviation_meters {
        let pickup_deviation = min_distance_to_route_meters(stops.pickup, route);
        let dropoff_deviation = min_distance_to_route_meters(stops.dropoff, route);
        if pickup_deviation > cap || dropoff_deviation > cap {
            return Ok(None);
        }
    }

    let mut best: Option<AssignmentCandidate> = None;

    // Pickup may go anywhere after the origin and before the destination;
    // the dropoff anywhere after the pickup, still before the destination.
    'pickup: for pickup_position in 1..route.len() {
        let mut with_pickup = Vec::with_capacity(route.len() + 2);
        with_pickup.extend_from_slice(&route[..pickup_position]);
        with_pickup.push(stops.pickup);
        with_pickup.extend_from_slice(&route[pickup_position..]);

        for dropoff_position in (pickup_position + 1)..with_pickup.len() {
            let mut candidate_route = with_pickup.clone();
            candidate_route.insert(dropoff_position, stops.dropoff);

            let updated_metrics =
                estimate_route_metrics(&candidate_route, options.average_speed_kmh);
            // Inserting points cannot shorten a route; clamp away the
            // floating-point dust so deltas are always non-negative.
            let additional_minutes = (updated_metrics.total_duration_minutes
                - base_metrics.total_duration_minutes)
                .max(0.0);
            if additional_minutes > options.max_additional_minutes {
                continue;
            }
            let additional_distance_km = (updated_metrics.total_distance_km
                - base_metrics.total_distance_km)
                .max(0.0);

            let improves = match &best {
                None => true,
                Some(current) => {
                    additional_minutes + COST_EPSILON_MINUTES < current.additional_minutes
                        || ((additional_minutes - current.additional_minutes).abs()
                            <= COST_EPSILON_MINUTES
                            && additional_distance_km + DISTANCE_EPSILON_KM
                                < current.additional_distance_km)
                }
            };

            if improves {
                let is_free = additional_minutes <= COST_EPSILON_MINUTES;
                best = Some(AssignmentCandidate {
                    pickup_insert_index: pickup_position,
                    dropoff_insert_index: dropoff_position,
                    additional_minutes,
                    additional_distance_km,
                    updated_route: candidate_route,
                    updated_metrics,
                    base_metrics,
                });
                if is_free {
                    break 'pickup;
                }
            }
        }
    }

    Ok(best)
}

/// Percentage view of a candidate relative to its base route.
///
/// A zero base duration or distance maps to 0%, never NaN or infinity;
/// brand-new and degenerate routes report "no increase" rather than
/// blowing up downstream formatting.
pub fn summarize_assignment(candidate: &AssignmentCandidate) -> AssignmentSummary {
    let additional_minutes_percent = percent_increase(
        candidate.additional_minutes,
        candidate.base_metrics.total_duration_minutes,
    );
    let additional_distance_percent = percent_increase(
        candidate.additional_distance_km,
        candidate.base_metrics.total_distance_km,
    );

    AssignmentSummary {
        pickup_insert_index: candidate.pickup_insert_index,
        dropoff_insert_index: candidate.dropoff_insert_index,
        additional_minutes: candidate.additional_minutes,
        additional_distance_km: candidate.additional_distance_km,
        additional_minutes_percent,
        additional_distance_percent,
        base_metrics: candidate.base_metrics,
        updated_metrics: candidate.updated_metrics,
    }
}

fn percent_increase(delta: f64, base: f64) -> f64 {
    if base > 0.0 { delta / base * 100.0 } else { 0.0 }
}
