//! Position service runtime.
//!
//! [`PositionService`] wires the site registry, dispatcher and metrics
//! together and drains an inbound message stream until shutdown.
//!
//! ```text
//! inbound ──► PositionService::run ──► Dispatcher ──► TrainWorker ──► Publisher
//!                                          │
//!                                          └──► SiteRegistry (site.register)
//! ```

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::dispatcher::Dispatcher;
use crate::site::{RegistryError, SiteRegistry};
use crate::telemetry::{MetricsSnapshot, ServiceMetrics};
use crate::transport::{InboundMessage, Publisher};

/// Errors raised while starting the service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("failed to open site registry: {0}")]
    Registry(#[from] RegistryError),
}

/// The running position service.
pub struct PositionService {
    registry: Arc<SiteRegistry>,
    dispatcher: Dispatcher,
    metrics: Arc<ServiceMetrics>,
    shutdown: CancellationToken,
}

impl PositionService {
    /// Open the registry named by `config` and build the service.
    ///
    /// Without a configured state file the registry lives in a temporary
    /// file removed when the service is dropped.
    pub fn new(
        config: &ServiceConfig,
        publisher: Arc<dyn Publisher>,
    ) -> Result<Self, ServiceError> {
        let registry = SiteRegistry::from_state_file(config.state_file.as_deref())?;
        info!(path = %registry.path().display(), "Site registry ready");
        Ok(Self::with_registry(config, Arc::new(registry), publisher))
    }

    /// Build the service around an existing registry.
    pub fn with_registry(
        config: &ServiceConfig,
        registry: Arc<SiteRegistry>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        let metrics = Arc::new(ServiceMetrics::new());
        let shutdown = CancellationToken::new();
        let dispatcher = Dispatcher::new(
            config,
            Arc::clone(&registry),
            publisher,
            Arc::clone(&metrics),
            shutdown.child_token(),
        );
        Self {
            registry,
            dispatcher,
            metrics,
            shutdown,
        }
    }

    pub fn registry(&self) -> &Arc<SiteRegistry> {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Token that stops [`run`](Self::run) when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Dispatch one message, logging it if dropped.
    pub async fn handle(&self, msg: &InboundMessage) {
        if let Err(e) = self.dispatcher.dispatch(msg).await {
            warn!(subject = %msg.subject, error = %e, "Dropped inbound message");
        }
    }

    /// Process inbound messages until the token is cancelled or the stream
    /// ends, then stop all train workers.
    ///
    /// Positions still pending at that point are not published.
    pub async fn run(&self, mut inbound: mpsc::Receiver<InboundMessage>) -> MetricsSnapshot {
        info!("Position service started");

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }

                received = inbound.recv() => match received {
                    Some(msg) => self.handle(&msg).await,
                    None => {
                        debug!("Inbound stream closed");
                        break;
                    }
                },
            }
        }

        self.dispatcher.shutdown().await;

        let snapshot = self.metrics.snapshot();
        info!(
            received = snapshot.messages_received,
            published = snapshot.positions_published,
            site_events = snapshot.site_events_published,
            dropped = snapshot.dropped(),
            uptime = %snapshot.uptime_human(),
            "Position service stopped"
        );
        snapshot
    }
}
