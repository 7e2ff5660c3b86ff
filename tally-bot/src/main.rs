//! tally-bot - episode rating service
//!
//! Loads the rating ledger, then serves the intake, interaction and results
//! endpoints plus the web health check.
//!
//! Startup halts if the stored ledger is unreadable: continuing with an
//! empty ledger would overwrite the real history on the first save.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tally_bot::{build_router, AppState};
use tally_common::config::{load_toml_config, locate_config_file, ConfigOverrides, Settings};
use tally_common::ledger::LedgerStore;
use tally_common::{Error, LedgerService};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for tally-bot
#[derive(Parser, Debug)]
#[command(name = "tally-bot")]
#[command(about = "Episode rating bot: records 1-10 ratings per episode and reports results")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Channel whose posts create episodes
    #[arg(long, env = "TALLY_INTAKE_CHANNEL")]
    intake_channel: Option<String>,

    /// Ledger document location
    #[arg(short, long, env = "TALLY_DATA_FILE")]
    data_file: Option<PathBuf>,

    /// Address to bind the HTTP server to
    #[arg(long, env = "TALLY_BIND")]
    bind: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "TALLY_PORT")]
    port: Option<u16>,

    /// Season part of generated episode titles
    #[arg(long, env = "TALLY_SEASON_LABEL")]
    season_label: Option<String>,

    /// Word preceding the ordinal in episode titles
    #[arg(long, env = "TALLY_EPISODE_MARKER")]
    episode_marker: Option<String>,

    /// tracing filter directive (overrides RUST_LOG defaults)
    #[arg(long, env = "TALLY_LOG")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = locate_config_file(args.config.as_deref());
    let file_config = match &config_path {
        Some(path) => load_toml_config(path)?,
        None => None,
    };
    let loaded_config = file_config.is_some();

    let settings = Settings::resolve(
        ConfigOverrides {
            intake_channel_id: args.intake_channel,
            data_file: args.data_file,
            bind_address: args.bind,
            port: args.port,
            season_label: args.season_label,
            episode_marker: args.episode_marker,
            log_level: args.log_level,
        },
        file_config,
    )?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tally-bot v{}", env!("CARGO_PKG_VERSION"));
    match (&config_path, loaded_config) {
        (Some(path), true) => info!("Config file: {}", path.display()),
        (Some(path), false) => warn!("Config file {} not found, using defaults", path.display()),
        (None, _) => info!("No config file found, using defaults"),
    }
    info!("Intake channel: {}", settings.intake_channel_id.as_str());
    info!("Ledger file: {}", settings.data_file.display());

    let store = LedgerStore::new(&settings.data_file, settings.titles.clone());
    let ledger = match LedgerService::open(store, settings.titles.clone()).await {
        Ok(ledger) => ledger,
        Err(e @ Error::CorruptState(_)) => {
            error!("Refusing to start: {}", e);
            error!(
                "Repair or move {} aside before restarting; it has not been modified",
                settings.data_file.display()
            );
            return Err(e.into());
        }
        Err(e) => {
            error!("Failed to load ledger: {}", e);
            return Err(e.into());
        }
    };

    let state = AppState::new(Arc::new(ledger), settings.intake_channel_id.clone());
    let app = build_router(state);

    let addr = format!("{}:{}", settings.bind_address, settings.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("tally-bot listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
