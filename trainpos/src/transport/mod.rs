//! Message transport boundary.
//!
//! The service does not talk to a broker directly. Inbound traffic arrives
//! as [`InboundMessage`] values (subject plus raw payload), and everything
//! the service emits goes through a [`Publisher`]. Binding these to NATS,
//! MQTT, stdin/stdout or an in-process channel is the caller's concern.
//!
//! # Subjects
//!
//! | Direction | Default subject          | Payload            |
//! |-----------|--------------------------|--------------------|
//! | in        | `train.gps`              | `GpsMessage`       |
//! | in        | `train.tracelet`         | `TraceletMessage`  |
//! | in        | `site.register`          | `SiteInfo`         |
//! | out       | `position.<train>`       | `TrainPosition`    |
//! | out       | `sites-event.<site>`     | `SiteEvent`        |

mod publisher;

pub use publisher::{publish_json, ChannelPublisher, PublishError, Publisher};

use bytes::Bytes;

/// Default subject for GPS fixes.
pub const GPS_SUBJECT: &str = "train.gps";

/// Default subject for tracelet fixes.
pub const TRACELET_SUBJECT: &str = "train.tracelet";

/// Default subject for site registrations.
pub const REGISTER_SITE_SUBJECT: &str = "site.register";

/// Default prefix for reconciled positions, followed by the train id.
pub const POSITION_SUBJECT_PREFIX: &str = "position";

/// Default base subject for site events, followed by the site id.
pub const SITE_EVENT_SUBJECT: &str = "sites-event";

/// A raw message received from the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub subject: String,
    pub payload: Bytes,
}

impl InboundMessage {
    pub fn new(subject: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            subject: subject.into(),
            payload: payload.into(),
        }
    }
}

/// A message handed to the broker for publishing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub subject: String,
    pub payload: Bytes,
}

impl OutboundMessage {
    /// Payload as UTF-8 text, lossy.
    pub fn payload_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}
