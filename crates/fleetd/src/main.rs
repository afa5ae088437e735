//! fleetd - Gateway Fleet Daemon
//!
//! Serves the gateway/device REST API from an in-memory store, optionally
//! persisted to a JSON snapshot between runs.
//!
//! Usage:
//!   fleetd [OPTIONS] [config.toml]

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use fleet_api::{create_router, AppState};
use fleet_core::MemoryStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{FleetdConfig, LogFormat};

/// Parsed command-line arguments
#[derive(Debug, Default)]
struct Args {
    /// Daemon config file (TOML)
    config_path: Option<PathBuf>,
    /// Overrides `[server] port`
    port: Option<u16>,
    /// Overrides `[storage] snapshot_path`
    snapshot: Option<PathBuf>,
    help: bool,
    /// Flags we did not recognise, reported once logging is up
    unknown: Vec<String>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Args> {
    let mut result = Args::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--port" | "-p" => {
                let value = args.next().context("Missing argument for --port")?;
                let port = value
                    .parse()
                    .with_context(|| format!("Invalid port: {}", value))?;
                result.port = Some(port);
            }
            "--snapshot" | "-s" => {
                let value = args.next().context("Missing argument for --snapshot")?;
                result.snapshot = Some(PathBuf::from(value));
            }
            "--help" | "-h" => {
                result.help = true;
            }
            arg if !arg.starts_with('-') => {
                // Positional argument = config file
                result.config_path = Some(PathBuf::from(arg));
            }
            _ => result.unknown.push(arg),
        }
    }

    Ok(result)
}

fn print_help() {
    eprintln!(
        r#"fleetd - Gateway Fleet Daemon

Usage: fleetd [OPTIONS] [config.toml]

Options:
  -p, --port <port>        Listen port (default 3000)
  -s, --snapshot <path>    JSON snapshot restored at startup, written on shutdown
  -h, --help               Print this help message

Examples:
  # Run with defaults on 0.0.0.0:3000, nothing persisted
  fleetd

  # Run with config file
  fleetd fleetd.toml

  # Persist the store across restarts
  fleetd -p 8080 -s /var/lib/fleetd/fleet.json
"#
    );
}

fn init_logging(config: &FleetdConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    let registry = tracing_subscriber::registry().with(filter);

    match config.logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn open_store(config: &FleetdConfig) -> anyhow::Result<Arc<MemoryStore>> {
    match &config.storage.snapshot_path {
        Some(path) if path.exists() => {
            tracing::info!("Restoring store from: {}", path.display());
            MemoryStore::load_from_file(path)
                .await
                .with_context(|| format!("Failed to restore snapshot '{}'", path.display()))
        }
        Some(path) => {
            tracing::info!(
                "Snapshot {} not found, starting with an empty store",
                path.display()
            );
            Ok(MemoryStore::new())
        }
        None => {
            tracing::info!("No snapshot configured, store will not be persisted");
            Ok(MemoryStore::new())
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1))?;
    if args.help {
        print_help();
        return Ok(());
    }

    let mut config = match &args.config_path {
        Some(path) => FleetdConfig::load(path)?,
        None => FleetdConfig::default(),
    };
    config.apply_overrides(args.port, args.snapshot.clone());

    init_logging(&config);

    tracing::info!("Starting fleetd (Gateway Fleet Daemon)");
    if let Some(path) = &args.config_path {
        tracing::info!("Loaded config from: {}", path.display());
    }
    for arg in &args.unknown {
        tracing::warn!("Unknown argument: {}", arg);
    }

    let store = open_store(&config).await?;
    let state = AppState::new(store.repositories());
    let app = create_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(path) = &config.storage.snapshot_path {
        store
            .save_to_file(path)
            .await
            .with_context(|| format!("Failed to write snapshot '{}'", path.display()))?;
    }

    tracing::info!("fleetd stopped");
    Ok(())
}
