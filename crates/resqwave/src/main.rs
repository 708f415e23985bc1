//! ResQWave weather service - cached forecasts for community alert terminals

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::{Config, LoggingConfig};
use resqwave_api::{AppState, create_router};
use resqwave_core::{SystemClock, TerminalForecastSource, WeatherCacheManager};
use resqwave_db::Database;
use resqwave_proxy::{OpenWeatherClient, OpenWeatherConfig};

/// ResQWave weather service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "RESQWAVE_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "RESQWAVE_PORT")]
    port: Option<u16>,

    /// OpenWeatherMap API key
    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    if let Some(api_key) = args.api_key {
        config.weather.api_key = api_key;
    }

    init_logging(&config.logging);

    info!("Starting ResQWave weather service v{}", env!("CARGO_PKG_VERSION"));

    // Initialize database
    if !config.database.is_in_memory()
        && let Some(parent) = Path::new(&config.database.path).parent()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create data directory {}", parent.display()))?;
    }
    let db = Database::new(&config.database.url()).await?;

    // Initialize upstream client
    if config.weather.api_key.is_empty() {
        warn!("No OpenWeatherMap API key configured; refreshes will fail");
    }
    let client = Arc::new(OpenWeatherClient::new(OpenWeatherConfig {
        base_url: config.weather.base_url.clone(),
        api_key: config.weather.api_key.clone(),
        timeout_secs: config.weather.timeout_secs,
        units: config.weather.units.clone(),
    })?);

    // Initialize weather cache
    let provider = Arc::new(TerminalForecastSource::new(db.clone(), client));
    let weather = WeatherCacheManager::new(
        Arc::new(db.clone()),
        provider,
        Arc::new(SystemClock),
        config.cache.to_cache_config(),
    );

    // Install Prometheus recorder
    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    let state = AppState::new(db, weather);
    let app = create_router(state, Some(Arc::new(metrics_handle)))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Determine bind address
    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind_addr, port))?;

    info!("Listening on {}", addr);
    info!("Upstream: {}", config.weather.base_url);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
