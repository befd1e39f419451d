//! Site entry and exit events.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction of a site transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteEventKind {
    Entered,
    Left,
}

impl fmt::Display for SiteEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteEventKind::Entered => write!(f, "entered"),
            SiteEventKind::Left => write!(f, "left"),
        }
    }
}

/// A train entered or left a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteEvent {
    pub train: String,
    pub event: SiteEventKind,
    pub site: String,
}

impl SiteEvent {
    pub fn entered(train: impl Into<String>, site: impl Into<String>) -> Self {
        Self {
            train: train.into(),
            event: SiteEventKind::Entered,
            site: site.into(),
        }
    }

    pub fn left(train: impl Into<String>, site: impl Into<String>) -> Self {
        Self {
            train: train.into(),
            event: SiteEventKind::Left,
            site: site.into(),
        }
    }

    /// Decode an event as published on the site event subject.
    pub fn from_slice(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }
}
