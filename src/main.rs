//! Contact form and portfolio service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Static site ──▶ http::server ──▶ submissions ──▶ services::{object_store, records, email}
//!                          │        ──▶ projects    ──▶ services::records
//!                          │        ──▶ admin       ──▶ services::records
//!                          │
//!           config (file + env, hot reload) · security (rate limit, sanitize)
//!           observability (tracing, metrics) · lifecycle (signals, shutdown)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use contact_handlers::config::{load_config, load_from_env, watcher::ConfigWatcher, BackendKind};
use contact_handlers::lifecycle::{wait_for_signal, Shutdown};
use contact_handlers::observability::{logging, metrics};
use contact_handlers::{Collaborators, HttpServer};

#[derive(Parser)]
#[command(name = "contact-handlers")]
#[command(about = "Contact submissions and portfolio projects over HTTP", long_about = None)]
struct Args {
    /// TOML configuration file. Watched for changes when given.
    #[arg(short, long, env = "CONTACT_CONFIG")]
    config: Option<PathBuf>,

    /// Use in-memory collaborators instead of AWS.
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };
    if args.memory {
        config.storage.backend = BackendKind::Memory;
    }

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "contact-handlers starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = ?config.storage.backend,
        rate_limit_window_ms = config.rate_limit.window_ms,
        rate_limit_max = config.rate_limit.max_per_window,
        request_timeout_secs = config.timeouts.request_secs,
        dev_mode = config.security.dev_mode,
        "Configuration loaded"
    );
    if config.admin.api_key.is_empty() {
        tracing::warn!("No admin key configured, project writes are disabled");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    // The watcher handle must outlive the server.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            match watcher.run() {
                Ok(handle) => (Some(handle), updates),
                Err(e) => {
                    tracing::error!(error = %e, "Config watcher failed to start, hot reload disabled");
                    (None, updates)
                }
            }
        }
        None => {
            let (_tx, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let services = Collaborators::from_config(&config).await;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        signal_shutdown.trigger();
    });

    let server = HttpServer::new(config, services);
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
