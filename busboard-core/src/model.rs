//! Domain data structures for stops, tracked services, and vehicle positions.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Mean road speed assumed when turning a distance into an arrival bucket.
///
/// Roughly 21 km/h, which is what urban buses average once stops and
/// traffic are accounted for.
pub const ASSUMED_SPEED_MPS: f64 = 6.0;

/// Distance under which a vehicle counts as arriving at the stop.
pub const ARRIVING_WITHIN_METERS: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// Geographic position in decimal degrees.
pub struct Coordinate {
    /// Latitude, positive north.
    pub latitude: f64,
    /// Longitude, positive east.
    pub longitude: f64,
}

impl Coordinate {
    /// Construct a coordinate without validating it; see [`crate::geo`].
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// One direction of one bus route, identified by line and bounding stops.
pub struct TrackedService {
    /// Route identifier as published by the operator (e.g. "1").
    pub line_ref: String,
    /// Stop code where the direction of interest begins.
    pub origin_code: String,
    /// Stop code where the direction of interest ends.
    pub destination_code: String,
}

impl TrackedService {
    /// Exact tuple match against a reported vehicle position.
    #[must_use]
    pub fn matches(&self, position: &VehiclePosition) -> bool {
        self.line_ref == position.line_ref
            && self.origin_code == position.origin_code
            && self.destination_code == position.destination_code
    }
}

impl fmt::Display for TrackedService {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "line {} ({} → {})",
            self.line_ref, self.origin_code, self.destination_code
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
/// One vehicle's most recent position report, as normalized from the feed.
pub struct VehiclePosition {
    /// Route identifier reported for the journey.
    pub line_ref: String,
    /// Origin stop code of the journey.
    pub origin_code: String,
    /// Destination stop code of the journey.
    pub destination_code: String,
    /// Operator's vehicle identifier, when present in the feed.
    pub vehicle_ref: Option<String>,
    /// Last reported position.
    pub position: Coordinate,
    /// Provider timestamp of the position report.
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Compass quadrant used to drop vehicles that have already passed the stop.
pub enum Cardinal {
    /// Bearings 270°–90°.
    North,
    /// Bearings 0°–180°.
    East,
    /// Bearings 90°–270°.
    South,
    /// Bearings 180°–360°.
    West,
}

impl Cardinal {
    /// Whether a bearing (degrees from north, 0–360) falls in this quadrant.
    ///
    /// Quadrants deliberately span 180° each so that a bus diagonally past
    /// the stop is still filtered out.
    #[must_use]
    pub fn covers(self, bearing: f64) -> bool {
        match self {
            Cardinal::North => !(90.0..270.0).contains(&bearing),
            Cardinal::East => (0.0..180.0).contains(&bearing),
            Cardinal::South => (90.0..270.0).contains(&bearing),
            Cardinal::West => (180.0..360.0).contains(&bearing),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
/// Coarse arrival classification shown to the rider.
pub enum EtaBucket {
    /// Vehicle is at or next to the stop.
    Arriving,
    /// Under five minutes away at the assumed speed.
    UnderFive,
    /// Under fifteen minutes away at the assumed speed.
    UnderFifteen,
    /// Anything further out.
    Far,
}

impl EtaBucket {
    /// Classify a distance from the stop under [`ASSUMED_SPEED_MPS`].
    #[must_use]
    pub fn from_distance(distance_meters: f64) -> Self {
        if distance_meters <= ARRIVING_WITHIN_METERS {
            return EtaBucket::Arriving;
        }
        let minutes = distance_meters / ASSUMED_SPEED_MPS / 60.0;
        if minutes < 5.0 {
            EtaBucket::UnderFive
        } else if minutes < 15.0 {
            EtaBucket::UnderFifteen
        } else {
            EtaBucket::Far
        }
    }
}

impl fmt::Display for EtaBucket {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EtaBucket::Arriving => "arriving",
            EtaBucket::UnderFive => "<5 min",
            EtaBucket::UnderFifteen => "<15 min",
            EtaBucket::Far => "far",
        };
        write!(formatter, "{label}")
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Display-ready arrival estimate for one matched vehicle.
pub struct ArrivalEstimate {
    /// The configured service this vehicle was matched to.
    pub service: TrackedService,
    /// Vehicle identifier for logs and diagnostics.
    pub vehicle_ref: Option<String>,
    /// Great-circle distance from the reference stop in meters.
    pub distance_meters: f64,
    /// Coarse arrival classification derived from the distance.
    pub eta: EtaBucket,
    /// Age of the position report at evaluation time.
    pub age: Duration,
}
