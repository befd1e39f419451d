//! Inbound position reports and the normalized train position.

use serde::{Deserialize, Serialize};

use crate::coord::{to_geodetic, Coordinate};

/// GPS fix reported by a train.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsMessage {
    /// Train identifier.
    #[serde(rename = "id")]
    pub train_id: String,

    /// Reported location.
    pub coordinates: Coordinate,
}

/// Tracelet fix: a planar offset in meters from a site's zero point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceletMessage {
    /// Offset towards east in meters.
    pub x: f64,

    /// Offset towards north in meters.
    pub y: f64,

    /// Site the offset is relative to.
    #[serde(rename = "site-id")]
    pub site_id: String,

    /// Train identifier.
    #[serde(rename = "train-id")]
    pub train_id: String,
}

/// Geodetic position tagged with its resolution class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,

    /// True for tracelet-derived positions, false for GPS.
    #[serde(rename = "hres")]
    pub high_res: bool,
}

/// A train's position as published on the reconciled stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainPosition {
    /// Train identifier.
    #[serde(rename = "id")]
    pub train_id: String,

    /// Site the train is in; empty when outside any known site.
    #[serde(rename = "site-id")]
    pub site_id: String,

    pub position: Position,
}

impl TrainPosition {
    /// Low-resolution position from a GPS fix. GPS carries no site.
    pub fn from_gps(msg: GpsMessage) -> Self {
        Self {
            train_id: msg.train_id,
            site_id: String::new(),
            position: Position {
                lat: msg.coordinates.lat,
                lon: msg.coordinates.lon,
                high_res: false,
            },
        }
    }

    /// High-resolution position from a tracelet fix and its site's zero point.
    pub fn from_tracelet(msg: TraceletMessage, zero: Coordinate) -> Self {
        let coordinate = to_geodetic(zero, msg.x, msg.y);
        Self {
            train_id: msg.train_id,
            site_id: msg.site_id,
            position: Position {
                lat: coordinate.lat,
                lon: coordinate.lon,
                high_res: true,
            },
        }
    }

    /// Whether this position came from a tracelet.
    #[inline]
    pub fn is_high_res(&self) -> bool {
        self.position.high_res
    }

    /// The site the train is in, if any.
    pub fn site(&self) -> Option<&str> {
        (!self.site_id.is_empty()).then_some(self.site_id.as_str())
    }
}
