//! SubPulse Server
//!
//! Run with: cargo run -- [--config PATH] [--host HOST] [--port PORT]
//!
//! Configuration is read from `--config`, or the first of
//! `~/.config/subpulse/config.toml`, `/etc/subpulse/config.toml` and
//! `./config.toml`, then overridden by `SUBPULSE_*` environment variables.
//! `RUST_LOG` takes precedence over the configured log level.

use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use subpulse::config::generate_default_config;
use subpulse::{
    default_plans, generate_subscriptions, serve, AppState, Config, LoggingConfig, Publisher,
    RecordStore, SubscriberRegistry,
};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "subpulse")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Subscription management server with a live analytics feed")]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print a default config file and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    init_logging(&config.logging);

    tracing::info!("Starting SubPulse server v{}", env!("CARGO_PKG_VERSION"));

    let plans = default_plans();
    let records = if config.seed.enabled {
        generate_subscriptions(&plans, config.seed.count, Utc::now(), &mut rand::thread_rng())
    } else {
        Vec::new()
    };
    tracing::info!(records = records.len(), plans = plans.len(), "Record store initialized");

    let store = Arc::new(RecordStore::with_records(records));
    let registry = Arc::new(SubscriberRegistry::new());

    let publisher = Arc::new(Publisher::new(
        Arc::clone(&registry),
        Arc::clone(&store),
        config.hub.publisher_config(),
    ));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let publisher_handle = publisher.start(shutdown_rx);

    let state = AppState::new(store, registry, plans);
    let result = serve(state, &config.server).await;

    // Stop broadcasting even if the server failed
    let _ = shutdown_tx.send(true);
    if let Err(e) = publisher_handle.await {
        tracing::warn!(error = %e, "Publisher task ended abnormally");
    }

    result?;
    tracing::info!("SubPulse server stopped");
    Ok(())
}

/// Initialize tracing from the logging config
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
