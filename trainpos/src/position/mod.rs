//! Position messages exchanged with the outside world.
//!
//! Inbound, trains report either a coarse GPS fix ([`GpsMessage`]) or a
//! high-resolution tracelet offset relative to a site ([`TraceletMessage`]).
//! Both are normalized into a [`TrainPosition`] before reconciliation. The
//! reconciled stream is published as [`TrainPosition`] values, and site
//! transitions as [`SiteEvent`] values.

mod event;
mod message;

pub use event::{SiteEvent, SiteEventKind};
pub use message::{GpsMessage, Position, TraceletMessage, TrainPosition};
