//! Trainpos - reconciled train positions from GPS and tracelet fixes
//!
//! Trains report their position through two sources: coarse GPS fixes and
//! high-resolution tracelet fixes, given as planar offsets from the zero
//! point of a registered site. This library merges both streams into one
//! position stream per train and reports when trains enter or leave sites.
//!
//! # Modules
//!
//! - [`coord`] - geodetic coordinates and the tracelet offset transform
//! - [`site`] - file-backed site registry
//! - [`position`] - inbound messages, reconciled positions and site events
//! - [`reconciler`] - per-train coalescing and transition detection
//! - [`dispatcher`] - routes inbound messages to per-train workers
//! - [`service`] - runs the dispatcher over an inbound stream
//! - [`transport`] - subjects, message envelopes and the publisher seam
//! - [`config`] - service configuration and INI loading
//! - [`telemetry`] - service counters
//! - [`logging`] - tracing setup

pub mod config;
pub mod coord;
pub mod dispatcher;
pub mod logging;
pub mod position;
pub mod reconciler;
pub mod service;
pub mod site;
pub mod telemetry;
pub mod transport;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
