//! Service configuration.
//!
//! [`ServiceConfig`] holds everything the position service needs at
//! startup. It can be built in code with the `with_*` setters, or loaded
//! from an INI file (see [`ServiceConfig::load_from`]) with the
//! `SITES_STATE_FILE` environment variable taking precedence for the
//! registry location.
//!
//! ```text
//! [sites]
//! state_file = /var/lib/trainpos/sites.json
//!
//! [reconciler]
//! idle_timeout_ms = 2000
//! channel_capacity = 200
//!
//! [subjects]
//! gps = train.gps
//! tracelet = train.tracelet
//! register_site = site.register
//! position_prefix = position
//! site_event = sites-event
//! ```

mod file;

pub use file::{config_directory, config_file_path, ConfigFileError};

use std::path::PathBuf;
use std::time::Duration;

use crate::transport::{
    GPS_SUBJECT, POSITION_SUBJECT_PREFIX, REGISTER_SITE_SUBJECT, SITE_EVENT_SUBJECT,
    TRACELET_SUBJECT,
};

/// Environment variable naming a persistent site state file.
pub const STATE_FILE_ENV: &str = "SITES_STATE_FILE";

/// Default idle window after which a pending position is flushed.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(2);

/// Default capacity of each per-train queue.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 200;

/// Subjects the service listens and publishes on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectConfig {
    /// Inbound GPS fixes.
    pub gps: String,
    /// Inbound tracelet fixes.
    pub tracelet: String,
    /// Inbound site registrations.
    pub register_site: String,
    /// Prefix for outbound positions.
    pub position_prefix: String,
    /// Base subject for outbound site events.
    pub site_event: String,
}

impl Default for SubjectConfig {
    fn default() -> Self {
        Self {
            gps: GPS_SUBJECT.to_string(),
            tracelet: TRACELET_SUBJECT.to_string(),
            register_site: REGISTER_SITE_SUBJECT.to_string(),
            position_prefix: POSITION_SUBJECT_PREFIX.to_string(),
            site_event: SITE_EVENT_SUBJECT.to_string(),
        }
    }
}

impl SubjectConfig {
    /// Subject a train's reconciled position is published on.
    pub fn position_subject(&self, train_id: &str) -> String {
        format!("{}.{}", self.position_prefix, train_id)
    }

    /// Subject events for a site are published on.
    pub fn site_event_subject(&self, site_id: &str) -> String {
        format!("{}.{}", self.site_event, site_id)
    }
}

/// Configuration for the position service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Persistent site state file. A temporary file is used when unset.
    pub state_file: Option<PathBuf>,

    /// Idle window after which a pending position is flushed.
    pub idle_timeout: Duration,

    /// Capacity of each per-train queue. Messages beyond it are dropped.
    pub channel_capacity: usize,

    /// Inbound and outbound subjects.
    pub subjects: SubjectConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            state_file: None,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            subjects: SubjectConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Set the persistent site state file.
    pub fn with_state_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_file = Some(path.into());
        self
    }

    /// Set the idle flush window.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the per-train queue capacity.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Set the subject configuration.
    pub fn with_subjects(mut self, subjects: SubjectConfig) -> Self {
        self.subjects = subjects;
        self
    }

    /// Override the state file from `SITES_STATE_FILE` if it is set and non-empty.
    pub fn with_env_overrides(self) -> Self {
        match std::env::var(STATE_FILE_ENV) {
            Ok(path) if !path.trim().is_empty() => self.with_state_file(path.trim()),
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert!(config.state_file.is_none());
        assert_eq!(config.idle_timeout, Duration::from_secs(2));
        assert_eq!(config.channel_capacity, 200);
        assert_eq!(config.subjects.gps, "train.gps");
        assert_eq!(config.subjects.tracelet, "train.tracelet");
        assert_eq!(config.subjects.register_site, "site.register");
    }

    #[test]
    fn test_builder_pattern() {
        let config = ServiceConfig::default()
            .with_state_file("/data/sites.json")
            .with_idle_timeout(Duration::from_millis(500))
            .with_channel_capacity(16);

        assert_eq!(config.state_file, Some(PathBuf::from("/data/sites.json")));
        assert_eq!(config.idle_timeout, Duration::from_millis(500));
        assert_eq!(config.channel_capacity, 16);
    }

    #[test]
    fn test_outbound_subjects() {
        let subjects = SubjectConfig::default();
        assert_eq!(subjects.position_subject("ice-1"), "position.ice-1");
        assert_eq!(subjects.site_event_subject("depot"), "sites-event.depot");
    }
}
