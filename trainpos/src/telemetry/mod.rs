//! Service telemetry for observability.
//!
//! Lock-free atomic counters updated by the dispatcher and the per-train
//! workers, plus a point-in-time snapshot for logging.
//!
//! ```text
//! Dispatcher / Workers ─────► ServiceMetrics ─────► MetricsSnapshot
//!                             (atomic counters)     (point-in-time copy)
//! ```

mod metrics;
mod snapshot;

pub use metrics::ServiceMetrics;
pub use snapshot::MetricsSnapshot;
