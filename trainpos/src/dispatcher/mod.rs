//! Inbound message dispatch.
//!
//! The [`Dispatcher`] decodes each inbound message by subject, turns
//! position reports into [`TrainPosition`]s and routes them to the train's
//! worker, starting one on first sight of a train id. Site registrations are
//! applied to the registry directly.
//!
//! The train map lock is held only to look up or create a worker and
//! enqueue with `try_send`; it is never held across a flush.

mod error;

pub use error::DispatchError;

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::position::{GpsMessage, TraceletMessage, TrainPosition};
use crate::reconciler::{TrainWorker, WorkerContext};
use crate::site::{RegistryResult, SiteInfo, SiteRegistry};
use crate::telemetry::ServiceMetrics;
use crate::transport::{InboundMessage, Publisher};

struct TrainHandle {
    tx: mpsc::Sender<TrainPosition>,
    task: JoinHandle<()>,
}

/// Routes inbound messages to per-train workers.
///
/// Must be used from within a tokio runtime; workers are spawned lazily and
/// registry calls run on the blocking pool.
pub struct Dispatcher {
    registry: Arc<SiteRegistry>,
    ctx: Arc<WorkerContext>,
    channel_capacity: usize,
    trains: Mutex<HashMap<String, TrainHandle>>,
    shutdown: CancellationToken,
}

impl Dispatcher {
    pub fn new(
        config: &ServiceConfig,
        registry: Arc<SiteRegistry>,
        publisher: Arc<dyn Publisher>,
        metrics: Arc<ServiceMetrics>,
        shutdown: CancellationToken,
    ) -> Self {
        let ctx = WorkerContext {
            publisher,
            subjects: config.subjects.clone(),
            metrics,
            idle_timeout: config.idle_timeout,
        };
        Self {
            registry,
            ctx: Arc::new(ctx),
            channel_capacity: config.channel_capacity.max(1),
            trains: Mutex::new(HashMap::new()),
            shutdown,
        }
    }

    /// Handle one inbound message.
    ///
    /// Errors mean the message was dropped; they are counted here and left
    /// to the caller to report.
    pub async fn dispatch(&self, msg: &InboundMessage) -> Result<(), DispatchError> {
        self.ctx.metrics.message_received();

        let subjects = &self.ctx.subjects;
        let result = if msg.subject == subjects.gps {
            self.handle_gps(&msg.payload)
        } else if msg.subject == subjects.tracelet {
            self.handle_tracelet(&msg.payload).await
        } else if msg.subject == subjects.register_site {
            self.handle_registration(&msg.payload).await
        } else {
            Err(DispatchError::UnknownSubject(msg.subject.clone()))
        };

        if let Err(e) = &result {
            self.record_failure(e);
        }
        result
    }

    /// Decode a GPS fix and route it as a low-resolution position.
    pub fn handle_gps(&self, payload: &[u8]) -> Result<(), DispatchError> {
        let msg: GpsMessage = serde_json::from_slice(payload)
            .map_err(|e| DispatchError::decode(&self.ctx.subjects.gps, e))?;
        msg.coordinates
            .validate()
            .map_err(|source| DispatchError::InvalidCoordinate {
                train_id: msg.train_id.clone(),
                source,
            })?;

        debug!(train_id = %msg.train_id, "GPS fix");
        self.route(TrainPosition::from_gps(msg))
    }

    /// Decode a tracelet fix, resolve its site and route it as a
    /// high-resolution position.
    pub async fn handle_tracelet(&self, payload: &[u8]) -> Result<(), DispatchError> {
        let msg: TraceletMessage = serde_json::from_slice(payload)
            .map_err(|e| DispatchError::decode(&self.ctx.subjects.tracelet, e))?;

        let site_id = msg.site_id.clone();
        let zero = match self
            .with_registry(move |registry| registry.zero_point(&site_id))
            .await?
        {
            Ok(zero) => zero,
            Err(e) if e.is_not_found() => {
                return Err(DispatchError::UnknownSite {
                    site_id: msg.site_id,
                    train_id: msg.train_id,
                })
            }
            Err(e) => return Err(e.into()),
        };

        debug!(train_id = %msg.train_id, site_id = %msg.site_id, "Tracelet fix");
        self.route(TrainPosition::from_tracelet(msg, zero))
    }

    /// Decode a site record and store it in the registry.
    pub async fn handle_registration(&self, payload: &[u8]) -> Result<(), DispatchError> {
        let result = match serde_json::from_slice::<SiteInfo>(payload) {
            Ok(info) => self
                .with_registry(move |registry| registry.register(info))
                .await
                .and_then(|stored| stored.map_err(DispatchError::from)),
            Err(e) => Err(DispatchError::decode(&self.ctx.subjects.register_site, e)),
        };

        match result {
            Ok(()) => self.ctx.metrics.site_registered(),
            Err(_) => self.ctx.metrics.registration_failed(),
        }
        result
    }

    /// Enqueue a position on its train's worker, starting the worker if needed.
    pub fn route(&self, position: TrainPosition) -> Result<(), DispatchError> {
        if self.shutdown.is_cancelled() {
            return Err(DispatchError::ShuttingDown);
        }

        let mut trains = self.trains.lock();
        let handle = trains
            .entry(position.train_id.clone())
            .or_insert_with_key(|train_id| self.spawn_worker(train_id));

        match handle.tx.try_send(position) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(position)) => Err(DispatchError::Backlog {
                train_id: position.train_id,
                capacity: self.channel_capacity,
            }),
            Err(TrySendError::Closed(position)) => {
                trains.remove(&position.train_id);
                Err(DispatchError::WorkerStopped(position.train_id))
            }
        }
    }

    /// Number of trains with a worker.
    pub fn active_trains(&self) -> usize {
        self.trains.lock().len()
    }

    /// Stop all workers and wait for them to exit.
    ///
    /// Pending positions are discarded. Later calls to [`route`](Self::route)
    /// fail with [`DispatchError::ShuttingDown`].
    pub async fn shutdown(&self) {
        self.shutdown.cancel();

        let handles: Vec<TrainHandle> = self.trains.lock().drain().map(|(_, h)| h).collect();
        let count = handles.len();

        for result in join_all(handles.into_iter().map(|h| h.task)).await {
            if let Err(e) = result {
                warn!(error = %e, "Train worker failed");
            }
        }
        info!(trains = count, "Dispatcher stopped");
    }

    /// Run a registry call on the blocking pool; the registry does file I/O.
    async fn with_registry<T, F>(&self, call: F) -> Result<RegistryResult<T>, DispatchError>
    where
        F: FnOnce(&SiteRegistry) -> RegistryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let registry = Arc::clone(&self.registry);
        tokio::task::spawn_blocking(move || call(&registry))
            .await
            .map_err(DispatchError::RegistryTask)
    }

    fn spawn_worker(&self, train_id: &str) -> TrainHandle {
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let worker = TrainWorker::new(train_id, rx, Arc::clone(&self.ctx));

        self.ctx.metrics.train_started();
        let task = tokio::spawn(worker.run(self.shutdown.child_token()));
        info!(train_id, "Started train worker");
        TrainHandle { tx, task }
    }

    fn record_failure(&self, error: &DispatchError) {
        let metrics = &self.ctx.metrics;
        match error {
            DispatchError::Decode { .. } | DispatchError::InvalidCoordinate { .. } => {
                metrics.decode_error()
            }
            DispatchError::UnknownSite { .. } => metrics.unknown_site(),
            DispatchError::UnknownSubject(_) => metrics.unknown_subject(),
            DispatchError::Backlog { .. } | DispatchError::WorkerStopped(_) => {
                metrics.backlog_drop()
            }
            DispatchError::Registry(_) | DispatchError::RegistryTask(_) => {
                metrics.registry_error()
            }
            DispatchError::ShuttingDown => metrics.shutdown_drop(),
        }
    }
}
