//! Core types and arrival estimation for the busboard stop monitor.

/// Resolved runtime configuration and its validation.
pub mod config;
/// Matching, staleness filtering, and ranking of vehicle positions.
pub mod estimator;
/// Great-circle geometry helpers.
pub mod geo;
/// Domain models shared by the feed client and the display frontend.
pub mod model;
/// Traits describing the vehicle feed and display sink boundaries.
pub mod ports;

pub use config::*;
pub use estimator::*;
pub use geo::*;
pub use model::*;
pub use ports::*;
