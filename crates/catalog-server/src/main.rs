//! Catalog server - release catalog API with publication cascade and read cache

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use catalog_api::{AppState, create_router};
use catalog_core::{CacheTtls, CatalogService, TtlCache};
use catalog_db::Database;
use config::{Config, LoggingConfig};

/// Catalog server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/catalog.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "CATALOG_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "CATALOG_PORT")]
    port: Option<u16>,

    /// Development mode: every read bypasses the cache
    #[arg(long, env = "CATALOG_DEV")]
    dev: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;

    init_logging(&config.logging);

    info!("Starting catalog server v{}", env!("CARGO_PKG_VERSION"));

    // Metrics recorder must be installed before any counter is touched
    let metrics_handle = if config.metrics.enabled {
        Some(Arc::new(PrometheusBuilder::new().install_recorder()?))
    } else {
        None
    };

    // Initialize database
    if let Some(parent) = Path::new(&config.database.path).parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    let db_url = format!("sqlite:{}?mode=rwc", config.database.path);
    let db = Database::new(&db_url).await?;

    // Initialize read cache
    let ttls = if args.dev {
        warn!("Development mode: read cache bypassed");
        CacheTtls::disabled()
    } else {
        config.cache.ttls()
    };
    let cache = Arc::new(TtlCache::new());
    cache.start(config.cache.sweep_interval());

    let catalog = Arc::new(CatalogService::new(db.clone(), cache.clone(), ttls));
    let state = AppState::new(catalog);

    let app = create_router(state, metrics_handle).layer(TraceLayer::new_for_http());

    // Determine bind address
    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache.stop();
    db.close().await;

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
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
