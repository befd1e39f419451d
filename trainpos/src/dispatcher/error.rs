//! Dispatch error types.

use thiserror::Error;

use crate::coord::CoordError;
use crate::site::RegistryError;

/// Reasons an inbound message was not routed.
///
/// None of these are fatal to the service: the message is dropped and the
/// error reported.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Payload is not valid JSON for the subject's message type.
    #[error("failed to decode {subject} message: {source}")]
    Decode {
        subject: String,
        #[source]
        source: serde_json::Error,
    },

    /// GPS fix outside the valid coordinate range.
    #[error("invalid coordinates for train {train_id}: {source}")]
    InvalidCoordinate {
        train_id: String,
        #[source]
        source: CoordError,
    },

    /// Tracelet references a site that was never registered.
    #[error("unknown site {site_id} in tracelet from train {train_id}")]
    UnknownSite { site_id: String, train_id: String },

    /// The site registry could not be read or written.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The blocking task running a registry call panicked or was cancelled.
    #[error("registry task failed: {0}")]
    RegistryTask(#[source] tokio::task::JoinError),

    /// No handler for this subject.
    #[error("no handler for subject {0}")]
    UnknownSubject(String),

    /// The train's queue is full.
    #[error("queue for train {train_id} is full ({capacity} pending)")]
    Backlog { train_id: String, capacity: usize },

    /// The train's worker is gone; the next message starts a new one.
    #[error("worker for train {0} has stopped")]
    WorkerStopped(String),

    /// The dispatcher is shutting down.
    #[error("dispatcher is shutting down")]
    ShuttingDown,
}

impl DispatchError {
    pub(crate) fn decode(subject: &str, source: serde_json::Error) -> Self {
        Self::Decode {
            subject: subject.to_string(),
            source,
        }
    }
}
