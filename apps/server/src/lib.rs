use std::sync::Arc;

use stock::{AddPolicy, CacheStore, MarketOverview, QuoteGateway, WatchlistManager};

pub mod api;
pub mod config;
pub mod error;

/// Everything the route handlers share. Built once at startup.
pub struct AppState {
    pub gateway: Arc<dyn QuoteGateway>,
    pub cache: CacheStore,
    pub watchlist: Arc<WatchlistManager>,
    pub market: Arc<MarketOverview>,
}

impl AppState {
    pub fn new(gateway: Arc<dyn QuoteGateway>, cache: CacheStore, policy: AddPolicy) -> Self {
        let watchlist = Arc::new(WatchlistManager::new(
            Arc::clone(&gateway),
            cache.clone(),
            policy,
        ));
        let market = Arc::new(MarketOverview::new(Arc::clone(&gateway), cache.clone()));

        Self {
            gateway,
            cache,
            watchlist,
            market,
        }
    }
}
