//! Lock-free atomic metrics collection.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

use super::MetricsSnapshot;

/// Counters for the position service.
///
/// All operations use `Relaxed` ordering; the counters are independent.
#[derive(Debug)]
pub struct ServiceMetrics {
    start_time: Instant,

    /// Inbound messages of any subject.
    messages_received: AtomicU64,
    /// Inbound messages dropped because they failed to decode.
    decode_errors: AtomicU64,
    /// Tracelets dropped because their site is not registered.
    unknown_sites: AtomicU64,
    /// Inbound messages on a subject the service does not handle.
    unknown_subjects: AtomicU64,
    /// Positions dropped because a train's queue was full.
    backlog_drops: AtomicU64,
    /// Inbound messages dropped because the registry could not be read or written.
    registry_errors: AtomicU64,
    /// Positions dropped because the service was stopping.
    shutdown_drops: AtomicU64,

    /// Site registrations persisted.
    sites_registered: AtomicU64,
    /// Site registrations that failed.
    registration_failures: AtomicU64,

    /// Reconciled positions published.
    positions_published: AtomicU64,
    /// Site events published.
    site_events_published: AtomicU64,
    /// Outbound messages the transport rejected.
    publish_failures: AtomicU64,

    /// Per-train workers running.
    trains_active: AtomicUsize,
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            messages_received: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            unknown_sites: AtomicU64::new(0),
            unknown_subjects: AtomicU64::new(0),
            backlog_drops: AtomicU64::new(0),
            registry_errors: AtomicU64::new(0),
            shutdown_drops: AtomicU64::new(0),
            sites_registered: AtomicU64::new(0),
            registration_failures: AtomicU64::new(0),
            positions_published: AtomicU64::new(0),
            site_events_published: AtomicU64::new(0),
            publish_failures: AtomicU64::new(0),
            trains_active: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub fn message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn unknown_site(&self) {
        self.unknown_sites.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn unknown_subject(&self) {
        self.unknown_subjects.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn backlog_drop(&self) {
        self.backlog_drops.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn registry_error(&self) {
        self.registry_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn shutdown_drop(&self) {
        self.shutdown_drops.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn site_registered(&self) {
        self.sites_registered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn registration_failed(&self) {
        self.registration_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn position_published(&self) {
        self.positions_published.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn site_event_published(&self) {
        self.site_events_published.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn publish_failed(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn train_started(&self) {
        self.trains_active.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn train_stopped(&self) {
        self.trains_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime: self.start_time.elapsed(),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            unknown_sites: self.unknown_sites.load(Ordering::Relaxed),
            unknown_subjects: self.unknown_subjects.load(Ordering::Relaxed),
            backlog_drops: self.backlog_drops.load(Ordering::Relaxed),
            registry_errors: self.registry_errors.load(Ordering::Relaxed),
            shutdown_drops: self.shutdown_drops.load(Ordering::Relaxed),
            sites_registered: self.sites_registered.load(Ordering::Relaxed),
            registration_failures: self.registration_failures.load(Ordering::Relaxed),
            positions_published: self.positions_published.load(Ordering::Relaxed),
            site_events_published: self.site_events_published.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
            trains_active: self.trains_active.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let snapshot = ServiceMetrics::new().snapshot();
        assert_eq!(snapshot.messages_received, 0);
        assert_eq!(snapshot.positions_published, 0);
        assert_eq!(snapshot.trains_active, 0);
        assert_eq!(snapshot.dropped(), 0);
    }

    #[test]
    fn test_counters_accumulate() {
        let metrics = ServiceMetrics::new();
        metrics.message_received();
        metrics.message_received();
        metrics.decode_error();
        metrics.unknown_site();
        metrics.registry_error();
        metrics.shutdown_drop();
        metrics.position_published();
        metrics.site_event_published();
        metrics.train_started();
        metrics.train_started();
        metrics.train_stopped();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.messages_received, 2);
        assert_eq!(snapshot.decode_errors, 1);
        assert_eq!(snapshot.unknown_sites, 1);
        assert_eq!(snapshot.registry_errors, 1);
        assert_eq!(snapshot.shutdown_drops, 1);
        assert_eq!(snapshot.positions_published, 1);
        assert_eq!(snapshot.site_events_published, 1);
        assert_eq!(snapshot.trains_active, 1);
        assert_eq!(snapshot.dropped(), 4);
    }
}
