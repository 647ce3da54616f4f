//! Great-circle geometry between the reference stop and reported vehicles.

use crate::model::Coordinate;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
/// Errors from geometric computations.
pub enum GeoError {
    /// A coordinate was non-finite or outside [-90, 90] / [-180, 180].
    #[error("invalid coordinate: lat={latitude}, lon={longitude}")]
    InvalidCoordinate {
        /// Offending latitude.
        latitude: f64,
        /// Offending longitude.
        longitude: f64,
    },
}

impl Coordinate {
    /// Check that both components are finite and within range.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidCoordinate`] otherwise.
    pub fn validate(self) -> Result<(), GeoError> {
        let in_range = self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude);

        if in_range {
            Ok(())
        } else {
            Err(GeoError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

/// Haversine great-circle distance between two coordinates in meters.
///
/// # Errors
///
/// Returns [`GeoError::InvalidCoordinate`] when either input is malformed.
pub fn distance(from: Coordinate, to: Coordinate) -> Result<f64, GeoError> {
    from.validate()?;
    to.validate()?;

    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlat = (to.latitude - from.latitude).to_radians();
    let dlon = (to.longitude - from.longitude).to_radians();

    let half_chord = (dlat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let angle = 2.0 * half_chord.sqrt().atan2((1.0 - half_chord).sqrt());

    Ok(EARTH_RADIUS_M * angle)
}

/// Initial bearing from one coordinate to another, degrees from north (0–360).
///
/// # Errors
///
/// Returns [`GeoError::InvalidCoordinate`] when either input is malformed.
pub fn bearing(from: Coordinate, to: Coordinate) -> Result<f64, GeoError> {
    from.validate()?;
    to.validate()?;

    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlon = (to.longitude - from.longitude).to_radians();

    let x = dlon.sin() * lat2.cos();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    Ok((x.atan2(y).to_degrees() + 360.0) % 360.0)
}
