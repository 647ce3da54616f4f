//! Turns raw vehicle positions into ranked, display-ready arrival estimates.

use chrono::{DateTime, Duration, Utc};

use crate::config::MonitorConfig;
use crate::geo;
use crate::model::{ArrivalEstimate, Cardinal, Coordinate, EtaBucket, TrackedService, VehiclePosition};

/// Pure evaluation component: match, filter, rank.
///
/// Holds only values copied out of the configuration; every call to
/// [`Estimator::evaluate`] is deterministic in its arguments.
#[derive(Debug, Clone)]
pub struct Estimator {
    reference: Coordinate,
    staleness: Duration,
    ignore_direction: Option<Cardinal>,
}

impl Estimator {
    /// Build an estimator from the resolved configuration.
    #[must_use]
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            reference: config.stop.coordinate(),
            staleness: i64::try_from(config.staleness_secs)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX),
            ignore_direction: config.ignore_direction,
        }
    }

    /// Evaluate one poll's worth of positions against the tracked services.
    ///
    /// Positions are kept when they match a service by exact
    /// (line, origin, destination) tuple, are no older than the staleness
    /// threshold, and are not in the ignored quadrant. Output is ordered by
    /// ascending distance, ties broken by line lexical order. No matches is
    /// an empty vector, never an error.
    #[must_use]
    pub fn evaluate(
        &self,
        positions: &[VehiclePosition],
        services: &[TrackedService],
        now: DateTime<Utc>,
    ) -> Vec<ArrivalEstimate> {
        let mut estimates: Vec<ArrivalEstimate> = positions
            .iter()
            .filter_map(|position| self.estimate_one(position, services, now))
            .collect();

        estimates.sort_by(|left, right| {
            left.distance_meters
                .total_cmp(&right.distance_meters)
                .then_with(|| left.service.line_ref.cmp(&right.service.line_ref))
        });

        estimates
    }

    fn estimate_one(
        &self,
        position: &VehiclePosition,
        services: &[TrackedService],
        now: DateTime<Utc>,
    ) -> Option<ArrivalEstimate> {
        let service = services.iter().find(|service| service.matches(position))?;

        let age = now - position.recorded_at;
        if age > self.staleness {
            return None;
        }

        // feed coordinates were validated at parse time; a bad one slipping
        // through is dropped, not propagated
        let distance_meters = geo::distance(self.reference, position.position).ok()?;

        if let Some(quadrant) = self.ignore_direction {
            let bearing = geo::bearing(self.reference, position.position).ok()?;
            if quadrant.covers(bearing) {
                return None;
            }
        }

        Some(ArrivalEstimate {
            service: service.clone(),
            vehicle_ref: position.vehicle_ref.clone(),
            distance_meters,
            eta: EtaBucket::from_distance(distance_meters),
            age,
        })
    }
}
