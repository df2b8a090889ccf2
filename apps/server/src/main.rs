use std::sync::Arc;

use anyhow::Result;
use server::{AppState, api::app_router, config::Config};
use stock::{CacheStore, FileStorage, QuoteClient, QuoteGateway};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let config = Config::from_env()?;

    let storage = Arc::new(FileStorage::open(&config.storage_path));
    info!(path = %storage.path().display(), "storage opened");
    let cache = CacheStore::new(storage);

    let gateway: Arc<dyn QuoteGateway> = Arc::new(QuoteClient::from_env()?);
    let state = Arc::new(AppState::new(gateway, cache, config.add_policy));

    // Startup continues on failure; the refreshers retry on their next tick.
    if let Err(e) = state.watchlist.load().await {
        warn!(error = %e, "initial watchlist load failed");
    }
    if let Err(e) = state.market.load().await {
        warn!(error = %e, "initial market load failed");
    }

    let watchlist_refresher = state.watchlist.spawn_refresher(config.refresh_interval);
    let market_refresher = state.market.spawn_refresher(config.refresh_interval);

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!(addr = %config.listen_addr, policy = ?config.add_policy, "listening");

    axum::serve(listener, app_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    watchlist_refresher.stop().await;
    market_refresher.stop().await;

    info!("Shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::{
            select,
            signal::unix::{SignalKind, signal},
        };
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
        select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv()  => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
