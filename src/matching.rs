//! Candidate ranking pipeline.
//!
//! Pulls open trips from the storage collaborator, runs the insertion
//! evaluator against each candidate independently, and returns a ranked,
//! truncated list of matches for the passenger. A single bad candidate
//! (malformed stored route, infeasible insertion) is logged and dropped —
//! it never fails the search. Zero matches is a successful empty report,
//! not an error.

use chrono::{DateTime, Duration, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{MatchError, StoreError};
use crate::geo::Coordinate;
use crate::insertion::{
    AssignmentSummary, InsertionOptions, PassengerStops, evaluate_passenger_insertion,
    summarize_assignment,
};
use crate::route::{RouteMetrics, min_distance_to_route_meters};
use crate::traits::{DriverSummary, ReviewRecord, TripQuery, TripRecord, TripStore, VehicleSummary};

/// Route endpoints within this many degrees of the trip's canonical
/// origin/destination count as matching.
const ENDPOINT_EPSILON_DEGREES: f64 = 1e-5;

/// Storage over-fetch factor, compensating for post-filter attrition.
const QUERY_OVERFETCH_FACTOR: usize = 3;

/// Caller tuning for a match search. Every field has a sensible default;
/// API layers pass through only what the client supplied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOptions {
    pub average_speed_kmh: f64,
    pub max_additional_minutes: f64,
    /// Width of the ± window around `pickup_datetime`, when one is given.
    pub time_window_minutes: i64,
    /// Result cap, floored at 1.
    pub max_results: usize,
    pub max_deviation_meters: Option<f64>,
    /// Desired pickup time; trips departing within the window qualify.
    /// Without it, only trips departing in the future qualify.
    pub pickup_datetime: Option<DateTime<Utc>>,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            average_speed_kmh: 30.0,
            max_additional_minutes: 5.0,
            time_window_minutes: 90,
            max_results: 10,
            max_deviation_meters: None,
            pickup_datetime: None,
        }
    }
}

/// The configuration a search actually ran with, echoed back in the report
/// for client transparency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AppliedMatchConfig {
    pub average_speed_kmh: f64,
    pub max_additional_minutes: f64,
    pub time_window_minutes: i64,
    pub max_results: usize,
    pub max_deviation_meters: Option<f64>,
    pub pickup_datetime: Option<DateTime<Utc>>,
}

/// One ranked candidate trip for a passenger. Ephemeral — built per search,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelMatchResult {
    pub trip_id: String,
    pub price: f64,
    pub departure_time: DateTime<Utc>,
    pub seats_available: u32,
    pub driver: DriverSummary,
    /// Average of the trip's review ratings; None when there are no reviews.
    pub driver_rating: Option<f64>,
    pub vehicle: VehicleSummary,
    pub assignment: AssignmentSummary,
    pub base_metrics: RouteMetrics,
    pub original_route: Vec<Coordinate>,
    pub updated_route: Vec<Coordinate>,
}

/// Result of a match search: the truncated ranking plus the total number of
/// feasible candidates before truncation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub matches: Vec<TravelMatchResult>,
    pub total_feasible: usize,
    pub applied: AppliedMatchConfig,
}

/// Outcome of evaluating a single trip for a passenger.
///
/// Infeasible is the expected "no acceptable detour" case and carries a
/// human-readable reason; hard failures surface as [`MatchError`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssignmentOutcome {
    Feasible(Box<TravelMatchResult>),
    Infeasible { reason: String },
}

/// Rank candidate trips for a passenger's pickup/dropoff pair.
///
/// Candidates are fetched from the store (over-fetched 3x against the result
/// cap), evaluated in parallel, sorted by added minutes then added distance
/// then price, and truncated to `max_results`. Per-candidate failures are
/// logged and excluded; a store failure fails the whole search.
pub fn find_matching_travels(
    store: &dyn TripStore,
    passenger_id: Option<&str>,
    stops: &PassengerStops,
    options: &MatchOptions,
) -> Result<MatchReport, MatchError> {
    validate_stops(stops)?;

    let applied = resolve_config(options);
    let insertion = insertion_options(&applied);

    let (departs_after, departs_before) = match applied.pickup_datetime {
        Some(pickup) => {
            let window = Duration::minutes(applied.time_window_minutes);
            (pickup - window, Some(pickup + window))
        }
        None => (Utc::now(), None),
    };

    let query = TripQuery {
        exclude_passenger_id: passenger_id.map(str::to_string),
        departs_after,
        departs_before,
        limit: applied.max_results * QUERY_OVERFETCH_FACTOR,
    };

    let trips = store.find_open_trips(&query)?;
    debug!(
        candidates = trips.len(),
        max_additional_minutes = applied.max_additional_minutes,
        "evaluating candidate trips"
    );

    // Each evaluation is pure and owns its trip record, so candidates fan
    // out in parallel with no shared state.
    let mut matches: Vec<TravelMatchResult> = trips
        .into_par_iter()
        .filter_map(|trip| {
            let trip_id = trip.id.clone();
            match evaluate_candidate(trip, stops, &insertion) {
                Ok(result) => result,
                Err(error) => {
                    warn!(trip_id = %trip_id, %error, "excluding candidate from search");
                    None
                }
            }
        })
        .collect();

    let total_feasible = matches.len();
    matches.sort_by(|a, b| {
        a.assignment
            .additional_minutes
            .total_cmp(&b.assignment.additional_minutes)
            .then(
                a.assignment
                    .additional_distance_km
                    .total_cmp(&b.assignment.additional_distance_km),
            )
            .then(a.price.total_cmp(&b.price))
    });
    matches.truncate(applied.max_results);

    Ok(MatchReport {
        matches,
        total_feasible,
        applied,
    })
}

/// Evaluate a single trip for a passenger, by trip id.
///
/// Used standalone (a driver reviewing one request) and equivalent to one
/// step of [`find_matching_travels`]. Coordinates are range-checked here;
/// an unknown trip id is an error, an infeasible insertion is not.
pub fn evaluate_trip_assignment(
    store: &dyn TripStore,
    trip_id: &str,
    stops: &PassengerStops,
    options: &MatchOptions,
) -> Result<AssignmentOutcome, MatchError> {
    validate_stops(stops)?;

    let applied = resolve_config(options);
    let insertion = insertion_options(&applied);

    let trip = store
        .trip_by_id(trip_id)?
        .ok_or_else(|| MatchError::TripNotFound(trip_id.to_string()))?;

    let route = reconstruct_route(&trip)?;
    match evaluate_candidate(trip, stops, &insertion)? {
        Some(result) => Ok(AssignmentOutcome::Feasible(Box::new(result))),
        None => Ok(AssignmentOutcome::Infeasible {
            reason: infeasibility_reason(&route, stops, &insertion),
        }),
    }
}

fn validate_stops(stops: &PassengerStops) -> Result<(), MatchError> {
    for point in [stops.pickup, stops.dropoff] {
        if !point.is_valid() {
            return Err(MatchError::InvalidCoordinate {
                latitude: point.latitude,
                longitude: point.longitude,
            });
        }
    }
    Ok(())
}

fn resolve_config(options: &MatchOptions) -> AppliedMatchConfig {
    AppliedMatchConfig {
        average_speed_kmh: options.average_speed_kmh,
        max_additional_minutes: options.max_additional_minutes,
        time_window_minutes: options.time_window_minutes,
        max_results: options.max_results.max(1),
        max_deviation_meters: options.max_deviation_meters,
        pickup_datetime: options.pickup_datetime,
    }
}

fn insertion_options(applied: &AppliedMatchConfig) -> InsertionOptions {
    InsertionOptions {
        average_speed_kmh: applied.average_speed_kmh,
        max_additional_minutes: applied.max_additional_minutes,
        max_deviation_meters: applied.max_deviation_meters,
    }
}

/// Run the evaluator against one trip and assemble a match result.
fn evaluate_candidate(
    trip: TripRecord,
    stops: &PassengerStops,
    options: &InsertionOptions,
) -> Result<Option<TravelMatchResult>, MatchError> {
    let route = reconstruct_route(&trip)?;

    let Some(candidate) = evaluate_passenger_insertion(&route, stops, options)? else {
        return Ok(None);
    };

    let assignment = summarize_assignment(&candidate);
    let driver_rating = average_rating(&trip.reviews);

    Ok(Some(TravelMatchResult {
        trip_id: trip.id,
        price: trip.price,
        departure_time: trip.departure_time,
        seats_available: trip.seats_available,
        driver: trip.driver,
        driver_rating,
        vehicle: trip.vehicle,
        assignment,
        base_metrics: candidate.base_metrics,
        original_route: route,
        updated_route: candidate.updated_route,
    }))
}

/// Rebuild a trip's planned route from stored data.
///
/// Stored waypoints win when at least 2 of them are valid coordinates;
/// otherwise the route degrades to [origin, destination]. Either way the
/// first and last points are forced to the trip's canonical endpoints
/// (within 1e-5 degrees), prepending/appending when stored waypoints omit
/// or mismatch them.
fn reconstruct_route(trip: &TripRecord) -> Result<Vec<Coordinate>, MatchError> {
    let origin = trip.origin.to_coordinate();
    let destination = trip.destination.to_coordinate();

    if !origin.is_valid() || !destination.is_valid() {
        return Err(StoreError::Malformed {
            trip_id: trip.id.clone(),
            detail: "origin or destination coordinate out of range".to_string(),
        }
        .into());
    }

    let mut route = match &trip.waypoints {
        Some(waypoints) => {
            let valid: Vec<Coordinate> = waypoints
                .iter()
                .map(|point| point.to_coordinate())
                .filter(Coordinate::is_valid)
                .collect();
            if valid.len() >= 2 {
                valid
            } else {
                vec![origin, destination]
            }
        }
        None => vec![origin, destination],
    };

    if !near(route[0], origin) {
        route.insert(0, origin);
    }
    if route.last().is_none_or(|last| !near(*last, destination)) {
        route.push(destination);
    }

    Ok(route)
}

fn near(a: Coordinate, b: Coordinate) -> bool {
    (a.latitude - b.latitude).abs() <= ENDPOINT_EPSILON_DEGREES
        && (a.longitude - b.longitude).abs() <= ENDPOINT_EPSILON_DEGREES
}

fn average_rating(reviews: &[ReviewRecord]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let total: f64 = reviews.iter().map(|review| review.rating).sum();
    Some(total / reviews.len() as f64)
}

fn infeasibility_reason(
    route: &[Coordinate],
    stops: &PassengerStops,
    options: &InsertionOptions,
) -> String {
    if let Some(cap) = options.max_deviation_meters {
        let pickup_deviation = min_distance_to_route_meters(stops.pickup, route);
        let dropoff_deviation = min_distance_to_route_meters(stops.dropoff, route);
        let worst = pickup_deviation.max(dropoff_deviation);
        if worst > cap {
            return format!(
                "stop is {worst:.0}m from the route, beyond the {cap:.0}m deviation cap"
            );
        }
    }
    format!(
        "no insertion adds less than {:.1} minutes to the route",
        options.max_additional_minutes
    )
}
