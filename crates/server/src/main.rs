use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use altproxy_core::{
    create_sink, load_config, load_config_from_env, prepare_cache_dir, validate_config,
    ArtifactStore, CatalogMerger, CatalogState, Config, HttpArtifactCache, HttpManifestFetcher,
    ManifestFetcher, ReadinessPolicy, RefreshScheduler,
};

use altproxy_server::api::create_router;
use altproxy_server::state::AppState;

/// Config file used when `ALTPROXY_CONFIG` is unset.
const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load()?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;
    let base_url = config
        .public_base_url()
        .context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Base URL: {}", base_url);
    info!("Cache directory: {:?}", config.cache.dir);
    info!("Sources: {}", config.refresh.sources.join(", "));

    prepare_cache_dir(&config.cache.dir)
        .with_context(|| format!("Failed to prepare cache directory {:?}", config.cache.dir))?;

    let fetcher: Arc<dyn ManifestFetcher> = Arc::new(
        HttpManifestFetcher::new(Duration::from_secs(config.refresh.fetch_timeout_secs))
            .context("Failed to create manifest fetcher")?,
    );
    let cache: Arc<dyn ArtifactStore> = Arc::new(
        HttpArtifactCache::new(
            config.cache.dir.clone(),
            config.cache.extension.clone(),
            Duration::from_secs(config.cache.read_timeout_secs),
        )
        .context("Failed to create artifact cache")?,
    );
    let merger = CatalogMerger::new(config.catalog.clone(), base_url.clone());
    let catalog = Arc::new(CatalogState::new());

    let scheduler = Arc::new(
        RefreshScheduler::new(
            config.refresh.clone(),
            fetcher,
            cache,
            merger,
            Arc::clone(&catalog),
        )
        .with_sink(create_sink(&config.notifications)),
    );
    scheduler.start();
    info!("Refresh scheduler started");

    if config.refresh.readiness == ReadinessPolicy::WaitForFirstCycle {
        info!("Waiting for the first catalog before accepting connections");
        tokio::select! {
            _ = catalog.wait_ready() => info!("First catalog published"),
            _ = shutdown_signal() => {
                warn!("Shutdown requested before the first catalog was published");
                scheduler.stop();
                return Ok(());
            }
        }
    }

    // Create app state
    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(
        AppState::new(config, base_url, Arc::clone(&catalog))
            .with_scheduler(Arc::clone(&scheduler)),
    );

    // Create router
    let app = create_router(state);

    // Start server
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Stopping refresh scheduler...");
    scheduler.stop();
    info!("Server shut down");

    Ok(())
}

/// Load the configuration from `ALTPROXY_CONFIG`, `./config.toml` or the
/// environment alone, in that order.
fn load() -> Result<Config> {
    let explicit = std::env::var_os("ALTPROXY_CONFIG").map(PathBuf::from);
    let path = explicit.or_else(|| {
        let default = Path::new(DEFAULT_CONFIG_FILE);
        default.exists().then(|| default.to_path_buf())
    });

    match path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))
        }
        None => {
            info!("No config file, using defaults and environment");
            load_config_from_env().context("Failed to load config from environment")
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
