//! muslib-songs - song catalogue service entry point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use muslib_common::config::{self, ConfigOverrides, ServiceConfig};
use muslib_songs::db::SongStore;
use muslib_songs::services::HttpSongDetailsClient;
use muslib_songs::{build_router, AppState};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_LEVEL: &str = "info";

/// Command-line arguments for muslib-songs
#[derive(Parser, Debug)]
#[command(name = "muslib-songs")]
#[command(about = "Song catalogue service with lyric verses")]
#[command(version)]
struct Args {
    /// TOML config file (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "MUSLIB_HTTP_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "MUSLIB_HTTP_PORT")]
    port: Option<u16>,

    /// SQLite database file
    #[arg(short, long, env = "MUSLIB_DATABASE")]
    database: Option<PathBuf>,

    /// Song details API endpoint
    #[arg(long, env = "MUSLIB_EXTERNAL_API_URL")]
    external_api_url: Option<String>,

    /// Song details API request timeout in seconds
    #[arg(long, env = "MUSLIB_EXTERNAL_API_TIMEOUT_SECS")]
    external_api_timeout_secs: Option<u64>,

    /// Log level when RUST_LOG is unset
    #[arg(long, env = "MUSLIB_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            database: self.database.clone(),
            external_api_url: self.external_api_url.clone(),
            external_api_timeout_secs: self.external_api_timeout_secs,
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config files are loaded with logging live; the configured level is
    // applied once resolution finishes
    let (filter, filter_handle) = reload::Layer::new(log_filter(
        args.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL),
    ));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting muslib-songs v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("MUSLIB_GIT_HASH"),
        env!("MUSLIB_BUILD_TIMESTAMP"),
        env!("MUSLIB_BUILD_PROFILE")
    );

    let config_path = config::resolve_config_path(args.config.as_deref());
    let toml = match &config_path {
        Some(path) => config::load_toml_config(path)?,
        None => {
            info!("No config directory on this platform (using flags, environment and defaults)");
            Default::default()
        }
    };
    let config = ServiceConfig::resolve(args.overrides(), toml)?;

    filter_handle
        .reload(log_filter(&config.log_level))
        .context("Failed to apply log level")?;

    info!("Database path: {}", config.database_path.display());
    let pool = muslib_common::db::init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let details = HttpSongDetailsClient::new(&config.external_api_url, config.external_api_timeout)
        .context("Failed to create song details client")?;
    info!("Song details API: {}", details.base_url());

    let state = AppState::new(SongStore::new(pool.clone()), Arc::new(details));
    let app = build_router(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    info!("muslib-songs listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Closing database");
    pool.close().await;

    info!("Server shutdown complete");
    Ok(())
}

/// `RUST_LOG` when set, otherwise `level` for the muslib crates
fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "muslib_songs={level},muslib_common={level},tower_http=debug",
            level = level
        ))
    })
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
