//! Point-in-time telemetry snapshot.

use std::fmt;
use std::time::Duration;

/// An immutable copy of the service counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub uptime: Duration,
    pub messages_received: u64,
    pub decode_errors: u64,
    pub unknown_sites: u64,
    pub unknown_subjects: u64,
    pub backlog_drops: u64,
    pub registry_errors: u64,
    pub shutdown_drops: u64,
    pub sites_registered: u64,
    pub registration_failures: u64,
    pub positions_published: u64,
    pub site_events_published: u64,
    pub publish_failures: u64,
    pub trains_active: usize,
}

impl MetricsSnapshot {
    /// Inbound messages dropped for any reason.
    pub fn dropped(&self) -> u64 {
        self.decode_errors
            + self.unknown_sites
            + self.unknown_subjects
            + self.backlog_drops
            + self.registry_errors
            + self.shutdown_drops
    }

    /// Uptime as `1h 02m 03s`.
    pub fn uptime_human(&self) -> String {
        let secs = self.uptime.as_secs();
        let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
        if hours > 0 {
            format!("{}h {:02}m {:02}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {:02}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] trains: {} | received: {} (dropped {}) | positions: {} | site events: {} | sites registered: {}",
            self.uptime_human(),
            self.trains_active,
            self.messages_received,
            self.dropped(),
            self.positions_published,
            self.site_events_published,
            self.sites_registered
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uptime_human() {
        let mut snapshot = MetricsSnapshot {
            uptime: Duration::from_secs(42),
            ..Default::default()
        };
        assert_eq!(snapshot.uptime_human(), "42s");

        snapshot.uptime = Duration::from_secs(125);
        assert_eq!(snapshot.uptime_human(), "2m 05s");

        snapshot.uptime = Duration::from_secs(3723);
        assert_eq!(snapshot.uptime_human(), "1h 02m 03s");
    }

    #[test]
    fn test_display_mentions_counts() {
        let snapshot = MetricsSnapshot {
            trains_active: 3,
            positions_published: 17,
            ..Default::default()
        };
        let text = snapshot.to_string();
        assert!(text.contains("trains: 3"));
        assert!(text.contains("positions: 17"));
    }
}
