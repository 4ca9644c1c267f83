//! Shared fixtures for integration tests.
//!
//! Provides a builder for trip records with sensible defaults and an
//! in-memory `TripStore` that honors the query's time window and limit the
//! way a real backend would.

use chrono::{Duration, Utc};

use trip_matcher::error::StoreError;
use trip_matcher::traits::{
    DriverSummary, ReviewRecord, StoredCoordinate, TripQuery, TripRecord, TripStore,
    VehicleSummary,
};

/// Builder for test trips with sensible defaults.
#[derive(Clone, Debug)]
pub struct TripBuilder {
    record: TripRecord,
}

impl TripBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            record: TripRecord {
                id: id.to_string(),
                price: 10.0,
                departure_time: Utc::now() + Duration::hours(1),
                seats_available: 3,
                driver: DriverSummary {
                    id: format!("driver-{id}"),
                    name: "Test Driver".to_string(),
                    contact: Some("driver@example.com".to_string()),
                },
                vehicle: VehicleSummary {
                    id: format!("vehicle-{id}"),
                    model: "Corolla".to_string(),
                    plate: "TEST-001".to_string(),
                },
                origin: StoredCoordinate {
                    latitude: 0.0,
                    longitude: 0.0,
                },
                destination: StoredCoordinate {
                    latitude: 0.0,
                    longitude: 1.0,
                },
                waypoints: None,
                reviews: Vec::new(),
            },
        }
    }

    pub fn price(mut self, price: f64) -> Self {
        self.record.price = price;
        self
    }

    pub fn departure_in_minutes(mut self, minutes: i64) -> Self {
        self.record.departure_time = Utc::now() + Duration::minutes(minutes);
        self
    }

    pub fn origin(mut self, latitude: f64, longitude: f64) -> Self {
        self.record.origin = StoredCoordinate {
            latitude,
            longitude,
        };
        self
    }

    pub fn destination(mut self, latitude: f64, longitude: f64) -> Self {
        self.record.destination = StoredCoordinate {
            latitude,
            longitude,
        };
        self
    }

    pub fn waypoints(mut self, points: &[(f64, f64)]) -> Self {
        self.record.waypoints = Some(
            points
                .iter()
                .map(|(latitude, longitude)| StoredCoordinate {
                    latitude: *latitude,
                    longitude: *longitude,
                })
                .collect(),
        );
        self
    }

    pub fn reviews(mut self, ratings: &[f64]) -> Self {
        self.record.reviews = ratings
            .iter()
            .map(|rating| ReviewRecord { rating: *rating })
            .collect();
        self
    }

    pub fn build(self) -> TripRecord {
        self.record
    }
}

/// In-memory trip store. Applies the query's time window and limit; status
/// and capacity filtering are assumed done (every held trip is "open").
pub struct InMemoryTripStore {
    trips: Vec<TripRecord>,
    failure: Option<String>,
}

impl InMemoryTripStore {
    pub fn new(trips: Vec<TripRecord>) -> Self {
        Self {
            trips,
            failure: None,
        }
    }

    /// A store whose every call fails, for propagation tests.
    pub fn failing(message: &str) -> Self {
        Self {
            trips: Vec::new(),
            failure: Some(message.to_string()),
        }
    }
}

impl TripStore for InMemoryTripStore {
    fn find_open_trips(&self, query: &TripQuery) -> Result<Vec<TripRecord>, StoreError> {
        if let Some(message) = &self.failure {
            return Err(StoreError::Unavailable(message.clone()));
        }

        Ok(self
            .trips
            .iter()
            .filter(|trip| trip.departure_time >= query.departs_after)
            .filter(|trip| {
                query
                    .departs_before
                    .is_none_or(|bound| trip.departure_time <= bound)
            })
            .filter(|trip| trip.seats_available > 0)
            .filter(|trip| {
                query
                    .exclude_passenger_id
                    .as_deref()
                    .is_none_or(|passenger| trip.driver.id != passenger)
            })
            .take(query.limit)
            .cloned()
            .collect())
    }

    fn trip_by_id(&self, trip_id: &str) -> Result<Option<TripRecord>, StoreError> {
        if let Some(message) = &self.failure {
            return Err(StoreError::Unavailable(message.clone()));
        }
        Ok(self.trips.iter().find(|trip| trip.id == trip_id).cloned())
    }
}
