//! Coordinate type definitions

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Valid latitude range
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// A geodetic coordinate in decimal degrees.
///
/// On the wire the longitude is carried as `lng`, matching the GPS feed and
/// the persisted site registry.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (-90 to 90)
    pub lat: f64,
    /// Longitude in degrees (-180 to 180)
    #[serde(rename = "lng")]
    pub lon: f64,
}

impl Coordinate {
    /// Create a new coordinate without validation.
    #[inline]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Check that latitude and longitude are within their valid ranges.
    ///
    /// NaN values are rejected as well.
    pub fn validate(&self) -> Result<(), CoordError> {
        if !(MIN_LAT..=MAX_LAT).contains(&self.lat) {
            return Err(CoordError::InvalidLatitude(self.lat));
        }
        if !(MIN_LON..=MAX_LON).contains(&self.lon) {
            return Err(CoordError::InvalidLongitude(self.lon));
        }
        Ok(())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Errors that can occur when validating coordinates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Latitude is outside valid range (-90 to 90)
    #[error("Invalid latitude: {0} (must be between {min} and {max})", min = MIN_LAT, max = MAX_LAT)]
    InvalidLatitude(f64),
    /// Longitude is outside valid range (-180 to 180)
    #[error("Invalid longitude: {0} (must be between {min} and {max})", min = MIN_LON, max = MAX_LON)]
    InvalidLongitude(f64),
}
