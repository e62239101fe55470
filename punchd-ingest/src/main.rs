//! Attendance ingest service - main entry point
//!
//! Binds the punch ingestion endpoint, reconciles incoming punches into
//! daily aggregates, and fans results out to live subscribers.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use punchd_ingest::config::{Config, ConfigOverrides, RuntimeSettings};
use punchd_ingest::db;
use punchd_ingest::service::Service;

/// Command-line arguments for punchd-ingest
#[derive(Parser, Debug)]
#[command(name = "punchd-ingest")]
#[command(about = "Real-time attendance punch ingestion service")]
#[command(version)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "PUNCHD_PORT")]
    port: Option<u16>,

    /// Path to SQLite database file
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Local UTC offset for day keying (e.g. "+05:00")
    #[arg(short, long, env = "PUNCHD_TZ")]
    timezone: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "punchd_ingest=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let overrides = ConfigOverrides {
        database_path: args.database,
        port: args.port,
        timezone: args.timezone,
    };
    let config = Config::load(args.config.as_deref(), overrides)
        .await
        .context("Failed to load configuration")?;

    info!("Starting punchd ingest service on port {}", config.port);

    let pool = db::connect(&config.database_path)
        .await
        .context("Failed to open database")?;
    db::init::initialize_database(&pool)
        .await
        .context("Failed to initialize database")?;

    let settings = RuntimeSettings::load(&pool)
        .await
        .context("Failed to load runtime settings")?;

    let service = Service::new(pool, config.policy, settings, config.port);
    service.start().await.context("Failed to start service")?;

    shutdown_signal().await;

    service.stop().await;
    info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
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
