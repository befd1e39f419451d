//! Per-train worker task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{Reconciler, SiteTransitionDetector};
use crate::config::SubjectConfig;
use crate::position::TrainPosition;
use crate::telemetry::ServiceMetrics;
use crate::transport::{publish_json, Publisher};

/// Shared dependencies of every worker.
pub(crate) struct WorkerContext {
    pub publisher: Arc<dyn Publisher>,
    pub subjects: SubjectConfig,
    pub metrics: Arc<ServiceMetrics>,
    pub idle_timeout: Duration,
}

/// Owns one train's reconciler and transition state.
///
/// Positions arrive through a bounded queue in the order they were routed.
/// The idle timer restarts after every wakeup, so a pending position is
/// flushed once the train has been quiet for the full idle window.
pub struct TrainWorker {
    train_id: String,
    rx: mpsc::Receiver<TrainPosition>,
    reconciler: Reconciler,
    detector: SiteTransitionDetector,
    ctx: Arc<WorkerContext>,
}

impl TrainWorker {
    pub(crate) fn new(
        train_id: impl Into<String>,
        rx: mpsc::Receiver<TrainPosition>,
        ctx: Arc<WorkerContext>,
    ) -> Self {
        Self {
            train_id: train_id.into(),
            rx,
            reconciler: Reconciler::new(),
            detector: SiteTransitionDetector::new(),
            ctx,
        }
    }

    /// Run until cancelled or until the queue's senders are gone.
    ///
    /// A position still pending at that point is dropped.
    pub async fn run(mut self, shutdown: CancellationToken) {
        debug!(train_id = %self.train_id, "Train worker started");

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                received = self.rx.recv() => match received {
                    Some(position) => {
                        if let Some(ready) = self.reconciler.offer(position) {
                            self.flush(ready);
                        }
                    }
                    None => break,
                },

                _ = tokio::time::sleep(self.ctx.idle_timeout) => {
                    if let Some(ready) = self.reconciler.on_idle() {
                        debug!(train_id = %self.train_id, "Idle window elapsed");
                        self.flush(ready);
                    }
                }
            }
        }

        if self.reconciler.pending().is_some() {
            debug!(train_id = %self.train_id, "Discarding pending position on stop");
        }
        self.ctx.metrics.train_stopped();
        debug!(train_id = %self.train_id, "Train worker stopped");
    }

    fn flush(&mut self, position: TrainPosition) {
        let subject = self.ctx.subjects.position_subject(&position.train_id);
        match publish_json(self.ctx.publisher.as_ref(), &subject, &position) {
            Ok(()) => self.ctx.metrics.position_published(),
            Err(e) => {
                self.ctx.metrics.publish_failed();
                warn!(train_id = %position.train_id, error = %e, "Failed to publish position");
            }
        }

        for event in self.detector.observe(&position) {
            info!(
                train_id = %event.train,
                site_id = %event.site,
                kind = %event.event,
                "Site transition"
            );
            let subject = self.ctx.subjects.site_event_subject(&event.site);
            match publish_json(self.ctx.publisher.as_ref(), &subject, &event) {
                Ok(()) => self.ctx.metrics.site_event_published(),
                Err(e) => {
                    self.ctx.metrics.publish_failed();
                    warn!(train_id = %event.train, error = %e, "Failed to publish site event");
                }
            }
        }
    }
}
