//! Error taxonomy.
//!
//! Precondition violations and collaborator failures are errors;
//! infeasibility (no insertion satisfies the caller's caps) is not — it is
//! an absent result, because "no acceptable detour exists" is an expected,
//! common outcome of a search.

use thiserror::Error;

/// Failures on the trip-storage collaborator side.
///
/// The pipeline propagates these unmodified so callers can distinguish
/// "search failed" from "search found nothing".
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("trip storage unavailable: {0}")]
    Unavailable(String),

    #[error("stored data for trip {trip_id} is malformed: {detail}")]
    Malformed { trip_id: String, detail: String },
}

/// Failures raised by the matching entry points.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Caller contract violation: the evaluator needs an origin and a
    /// destination at minimum.
    #[error("route must have at least 2 points, got {points}")]
    RouteTooShort { points: usize },

    #[error("coordinate out of range: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("trip {0} not found")]
    TripNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
