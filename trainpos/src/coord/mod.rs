//! Coordinate conversion module
//!
//! Provides the geodetic [`Coordinate`] type and the conversion from a
//! site-local planar offset (meters east/north of a site's zero point) to a
//! geodetic coordinate.
//!
//! The conversion is an equirectangular small-displacement approximation.
//! It is accurate for offsets of tens to a few hundred meters, which covers
//! tracelet positioning inside a depot or station. There is no curvature
//! correction beyond scaling longitude by the cosine of the latitude, and the
//! result is undefined at the poles.

mod types;

pub use types::{CoordError, Coordinate, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

use std::f64::consts::PI;

/// Equatorial radius of the earth in kilometers (WGS 84).
pub const EARTH_RADIUS_KM: f64 = 6378.137;

/// Converts a planar offset relative to `zero` into a geodetic coordinate.
///
/// # Arguments
///
/// * `zero` - Reference point the offset is measured from
/// * `dx` - Offset towards east in meters
/// * `dy` - Offset towards north in meters
///
/// Inputs are not validated; callers must keep the offsets small.
#[inline]
pub fn to_geodetic(zero: Coordinate, dx: f64, dy: f64) -> Coordinate {
    let lat = zero.lat + (dy / EARTH_RADIUS_KM / 1000.0) * (180.0 / PI);
    let lon = zero.lon
        + (dx / EARTH_RADIUS_KM / 1000.0) * (180.0 / PI) / (zero.lat * PI / 180.0).cos();
    Coordinate { lat, lon }
}
