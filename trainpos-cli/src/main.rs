//! Trainpos CLI - runs the position service over stdin/stdout
//!
//! Inbound messages are read from stdin and outbound positions and site
//! events are written to stdout, one `<subject> <json>` per line. Logs go to
//! stderr and to `<log-dir>/trainpos.log`.

mod error;
mod stream;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};

use trainpos::config::ServiceConfig;
use trainpos::logging::{default_log_dir, default_log_file, init_logging};
use trainpos::service::PositionService;
use trainpos::transport::ChannelPublisher;

use error::CliError;

/// Buffered inbound lines between the stdin reader and the service.
const INBOUND_CAPACITY: usize = 1024;

/// Time given to blocking stdin reads to wind down after the service stops.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

/// Extra time past the idle window kept open after end of input.
const LINGER_MARGIN: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "trainpos", version)]
#[command(about = "Reconcile train GPS and tracelet positions into one stream", long_about = None)]
struct Args {
    /// Configuration file (default: ~/.trainpos/config.ini)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Persistent site state file (overrides config and SITES_STATE_FILE)
    #[arg(long)]
    sites_state_file: Option<PathBuf>,

    /// Idle window in milliseconds before a pending position is published
    #[arg(long)]
    idle_timeout_ms: Option<u64>,

    /// Directory for the log file
    #[arg(long, default_value = default_log_dir())]
    log_dir: PathBuf,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        e.exit();
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let config = resolve_config(&args)?;

    let _logging_guard = init_logging(&args.log_dir, default_log_file())
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;
    info!(version = trainpos::VERSION, "Starting trainpos");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    let result = runtime.block_on(serve(config));

    // stdin reads run on a blocking thread that cannot be interrupted.
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

/// Config file, then `SITES_STATE_FILE`, then command-line flags.
fn resolve_config(args: &Args) -> Result<ServiceConfig, CliError> {
    let config = match &args.config {
        Some(path) => ServiceConfig::load_from(path)?,
        None => ServiceConfig::load()?,
    };
    let mut config = config.with_env_overrides();

    if let Some(path) = &args.sites_state_file {
        config = config.with_state_file(path);
    }
    if let Some(ms) = args.idle_timeout_ms {
        if ms == 0 {
            return Err(CliError::InvalidArgument(
                "--idle-timeout-ms must be positive".to_string(),
            ));
        }
        config = config.with_idle_timeout(Duration::from_millis(ms));
    }
    Ok(config)
}

async fn serve(config: ServiceConfig) -> Result<(), CliError> {
    let (publisher, outbound) = ChannelPublisher::new();
    let service = PositionService::new(&config, Arc::new(publisher))?;
    let shutdown = service.shutdown_token();

    let signal_token = shutdown.clone();
    ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("Received shutdown signal, stopping...");
        signal_token.cancel();
    })
    .map_err(|e| CliError::Signal(e.to_string()))?;

    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
    let reader = tokio::spawn(stream::read_inbound(
        tokio::io::stdin(),
        inbound_tx,
        config.idle_timeout + LINGER_MARGIN,
        shutdown.clone(),
    ));
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        stream::write_outbound(&mut stdout, outbound).await
    });

    let snapshot = service.run(inbound_rx).await;

    // Dropping the service closes the publisher, which ends the writer.
    drop(service);
    shutdown.cancel();

    match writer.await {
        Ok(Ok(lines)) => info!(lines, "Output closed"),
        Ok(Err(e)) => return Err(CliError::Io(e)),
        Err(e) => warn!(error = %e, "Output task failed"),
    }
    match reader.await {
        Ok(Ok(forwarded)) => info!(forwarded, "Input closed"),
        Ok(Err(e)) => return Err(CliError::Io(e)),
        Err(e) => warn!(error = %e, "Input task failed"),
    }

    info!("{}", snapshot);
    Ok(())
}
