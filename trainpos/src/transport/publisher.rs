//! Outbound publishing.

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;

use super::OutboundMessage;

/// Errors raised while publishing a message.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The value could not be serialized.
    #[error("failed to encode message for {subject}: {source}")]
    Encode {
        subject: String,
        #[source]
        source: serde_json::Error,
    },

    /// The receiving side of the transport is gone.
    #[error("transport closed, dropped message for {0}")]
    Closed(String),
}

/// Sink for outbound messages.
///
/// Publishing is fire-and-forget: implementations must not block for long,
/// as they are called from the per-train workers.
pub trait Publisher: Send + Sync + 'static {
    /// Publish a raw payload on `subject`.
    fn publish(&self, subject: &str, payload: Bytes) -> Result<(), PublishError>;
}

/// Serialize `value` as JSON and publish it on `subject`.
pub fn publish_json<T: Serialize + ?Sized>(
    publisher: &dyn Publisher,
    subject: &str,
    value: &T,
) -> Result<(), PublishError> {
    let payload = serde_json::to_vec(value).map_err(|source| PublishError::Encode {
        subject: subject.to_string(),
        source,
    })?;
    publisher.publish(subject, Bytes::from(payload))
}

/// Publisher that forwards messages into an unbounded channel.
///
/// The receiver is typically drained by the task that owns the real broker
/// connection, or inspected directly in tests.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl ChannelPublisher {
    /// Create a publisher and the receiver for its messages.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Publisher for ChannelPublisher {
    fn publish(&self, subject: &str, payload: Bytes) -> Result<(), PublishError> {
        self.tx
            .send(OutboundMessage {
                subject: subject.to_string(),
                payload,
            })
            .map_err(|_| PublishError::Closed(subject.to_string()))
    }
}
