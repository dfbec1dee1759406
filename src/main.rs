use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{error, info, warn};
use url::Url;

mod api;
mod browser;
mod cache;
mod config;
mod crawl;
mod error;
mod extract;
mod models;
mod normalize;
mod scheduler;

use api::AppState;
use browser::{ChromeLauncher, SessionManager};
use cache::SnapshotCache;
use config::Config;
use crawl::{SnapshotBuilder, SourceCatalog, SourceCrawler};
use extract::ExtractorSet;
use models::SnapshotKind;
use scheduler::RefreshScheduler;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let catalog = Arc::new(SourceCatalog::load(&config.sources_path)?);
    info!(
        "Source catalog loaded: {} sources ({} full, {} today)",
        catalog.len(),
        catalog.for_snapshot(SnapshotKind::Full).len(),
        catalog.for_snapshot(SnapshotKind::Today).len()
    );
    if catalog.for_snapshot(SnapshotKind::Full).is_empty() {
        warn!("No fixtures sources configured, /matches will stay unavailable");
    }

    let base_url = Url::parse(&config.source_base_url)
        .with_context(|| format!("parsing SOURCE_BASE_URL {}", config.source_base_url))?;
    let crawler = SourceCrawler::new(
        ExtractorSet::browser(config.extract_options()),
        base_url,
        config.sport.clone(),
    )
    .with_result_lookups(config.result_lookups);
    let builder = SnapshotBuilder::new(
        Arc::new(crawler),
        config.crawl_concurrency,
        config.drift_alarm_ratio,
    );

    let sessions = Arc::new(SessionManager::new(Arc::new(ChromeLauncher::new(
        config.browser(),
    ))));
    let cache = SnapshotCache::new();
    let shutdown = Arc::new(Notify::new());

    let scheduler_handle = RefreshScheduler::new(
        Arc::clone(&sessions),
        builder,
        cache.clone(),
        Arc::clone(&catalog),
        config.cycle_period(),
        config.full_refresh_every,
        Arc::clone(&shutdown),
    )
    .spawn();

    // Start the HTTP server
    let app = api::router(AppState { cache, catalog });
    let addr: SocketAddr = config.listen_addr.parse()?;
    info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let signal = Arc::clone(&shutdown);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            signal.notify_one();
        })
        .await?;

    if let Err(e) = scheduler_handle.await {
        warn!("Refresh scheduler task ended abnormally: {}", e);
    }
    sessions.release().await;
    info!("Shutdown complete");

    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM. A handler that cannot be installed never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl-C received, shutting down"),
        _ = terminate => info!("SIGTERM received, shutting down"),
    }
}
