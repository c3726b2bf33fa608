//! Bulletin Daemon - Service registry with liveness probing
//!
//! Accepts service registrations over HTTP, probes every registered URL on
//! a fixed interval, and serves an HTML page listing each service with its
//! current status.
//!
//! # Usage
//!
//! ```bash
//! # Start on the default port (8087), state in the working directory
//! bulletind
//!
//! # Custom port and state directory
//! bulletind -p 9000 --root /var/lib/bulletin
//!
//! # Register and remove a service
//! curl 'http://localhost:8087/add?name=api&url=http%3A%2F%2Fapi.local%2Fhealth'
//! curl 'http://localhost:8087/del?name=api'
//!
//! # Enable debug logging
//! RUST_LOG=bulletind=debug bulletind
//! ```
//!
//! Logs are appended to `<root>/log/bulletin.log`; registry state lives in
//! `<root>/services.json`.
//!
//! # Signal Handling
//!
//! - SIGTERM/SIGINT: Graceful shutdown

use std::env;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::process;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bulletind::config::{Config, DEFAULT_PORT};
use bulletind::prober::{spawn_prober_task, StatusProber};
use bulletind::registry::spawn_registry;
use bulletind::server::HttpServer;

/// Log levels used when `RUST_LOG` does not say otherwise
const DEFAULT_LOG_DIRECTIVES: &str = "bulletind=info,bulletin_core=info";

/// Bulletin daemon - service registry with liveness probing
#[derive(Parser, Debug)]
#[command(name = "bulletind", version, about)]
struct Args {
    /// Port to run the web server on
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Directory holding services.json and log/ (defaults to the working directory)
    #[arg(long)]
    root: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let root = match args.root {
        Some(root) => root,
        None => env::current_dir().context("Failed to determine working directory")?,
    };
    let config = Config::new(root, args.port);

    init_logging(&config)?;

    run_daemon(config)
}

/// Sends all tracing output to `<root>/log/bulletin.log`.
fn init_logging(config: &Config) -> Result<()> {
    let log_dir = config.log_dir();
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let log_path = config.log_file();
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(env::var("RUST_LOG").ok().as_deref()))
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();

    Ok(())
}

/// Builds the log filter from `RUST_LOG`, falling back to the default
/// directives when it is unset, blank or unparsable.
fn env_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_DIRECTIVES))
}

/// Runs the daemon (async entry point).
#[tokio::main]
async fn run_daemon(config: Config) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        root = %config.root().display(),
        "Bulletin daemon starting"
    );

    // Create cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();

    // Setup signal handlers
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!(error = %e, "Error waiting for shutdown signal");
        }
        info!("Shutdown signal received");
        shutdown_token.cancel();
    });

    // Spawn the service registry, seeded from services.json
    let store = config.store();
    info!(path = %store.path().display(), "Loading service store");
    let registry = spawn_registry(store).context("Failed to start service registry")?;

    // Bind before anything else runs so a busy port fails fast
    let server = match HttpServer::bind(config.listen_addr, registry.clone(), cancel_token.clone()) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "Failed to start HTTP server");
            return Err(e.into());
        }
    };

    // Spawn the status prober
    let prober = StatusProber::new(registry, config.probe_timeout)
        .context("Failed to create status prober")?;
    let prober_task = spawn_prober_task(prober, config.probe_interval, cancel_token.clone());

    if let Err(e) = server.run().await {
        error!(error = %e, "Server error");
        cancel_token.cancel();
        return Err(e.into());
    }

    cancel_token.cancel();
    let _ = prober_task.await;

    info!("Bulletin daemon stopped");
    Ok(())
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}
