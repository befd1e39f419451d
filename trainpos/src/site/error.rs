//! Error types for the site registry.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::coord::CoordError;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur while reading or updating the site registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The state file could not be created, read or written.
    #[error("site state file {path} is not accessible: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The state file does not hold a valid site map.
    #[error("site state file {path} is not a valid site map: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The site map could not be serialized.
    #[error("failed to encode site map: {0}")]
    Encode(#[source] serde_json::Error),

    /// No site with this id has been registered.
    #[error("site {0} not found")]
    NotFound(String),

    /// The site carries an out-of-range coordinate.
    #[error("site {site_id} has an invalid coordinate: {source}")]
    InvalidSite {
        site_id: String,
        #[source]
        source: CoordError,
    },
}

impl RegistryError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means the site is simply unknown.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
