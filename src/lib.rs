//! trip-matcher — dynamic route-insertion matching for ride sharing.
//!
//! Given a driver's planned route and a passenger's pickup/dropoff pair,
//! find the cheapest way (in added travel time, under a detour cap) to
//! splice the passenger's stops into the route, and rank candidate trips
//! for a passenger across many drivers. Distances are great-circle
//! estimates at an assumed average speed; there is no road network here.

pub mod error;
pub mod geo;
pub mod insertion;
pub mod matching;
pub mod route;
pub mod simplify;
pub mod traits;
