//! Storage collaborator boundary.
//!
//! The matcher never talks to a database itself; the embedding app
//! implements [`TripStore`] over whatever persistence it has. Records here
//! are intentionally plain: the matcher reads them, evaluates, and returns
//! ephemeral results — persisting an accepted updated route is the caller's
//! write, driven by the evaluator's output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::geo::Coordinate;

/// A coordinate as it appears in stored trip data.
///
/// Storage payloads use either `latitude`/`longitude` or `lat`/`lng` keys;
/// this type is the single place that variance is absorbed. The core
/// [`Coordinate`] type stays strict and canonical.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoredCoordinate {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lng", alias = "lon")]
    pub longitude: f64,
}

impl StoredCoordinate {
    pub fn to_coordinate(self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

impl From<Coordinate> for StoredCoordinate {
    fn from(coordinate: Coordinate) -> Self {
        Self {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
        }
    }
}

/// Driver details carried through to match results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverSummary {
    pub id: String,
    pub name: String,
    pub contact: Option<String>,
}

/// Vehicle details carried through to match results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSummary {
    pub id: String,
    pub model: String,
    pub plate: String,
}

/// A single review of the trip's driver; ratings are averaged per match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub rating: f64,
}

/// A candidate trip as returned by the storage collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    pub id: String,
    pub price: f64,
    pub departure_time: DateTime<Utc>,
    pub seats_available: u32,
    pub driver: DriverSummary,
    pub vehicle: VehicleSummary,
    pub origin: StoredCoordinate,
    pub destination: StoredCoordinate,
    /// Planned waypoints, when the trip has any beyond origin/destination.
    /// Absent or unusable waypoints fall back to a two-point route.
    pub waypoints: Option<Vec<StoredCoordinate>>,
    pub reviews: Vec<ReviewRecord>,
}

/// Query the pipeline issues for candidate trips.
///
/// Status ("confirmed or open") and capacity ("seats remaining") filters are
/// part of the [`TripStore::find_open_trips`] contract itself — the host app
/// owns its status enum, so they are not modeled here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripQuery {
    /// Requesting passenger, so their own trips are excluded when known.
    pub exclude_passenger_id: Option<String>,
    pub departs_after: DateTime<Utc>,
    /// Upper bound of the search window; open-ended when None.
    pub departs_before: Option<DateTime<Utc>>,
    /// Maximum records to return. The pipeline over-fetches relative to the
    /// caller's result cap to compensate for post-filter attrition.
    pub limit: usize,
}

/// Read access to persisted trips.
pub trait TripStore {
    /// Trips that are open for matching (confirmed/open status, seats
    /// remaining) within the query's time window.
    fn find_open_trips(&self, query: &TripQuery) -> Result<Vec<TripRecord>, StoreError>;

    /// A single trip by id, or None when it does not exist.
    fn trip_by_id(&self, trip_id: &str) -> Result<Option<TripRecord>, StoreError>;
}
