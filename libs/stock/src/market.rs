use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::{
    cache::{CacheStore, MARKET_INDEX_KEY},
    error::GatewayError,
    gateway::QuoteGateway,
    models::Quote,
    poller::PeriodicTask,
    refresh::RefreshState,
    symbol::{display_name, encode_symbol, tradingview_url},
};

/// Indices shown on the market overview, in display order.
pub const INDICES: [&str; 3] = ["^GSPC", "^DJI", "^IXIC"];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexQuote {
    #[serde(flatten)]
    pub quote: Quote,
    pub display_name: String,
    /// Symbol escaped for a URL path segment.
    pub path: String,
    pub tradingview_url: String,
}

impl From<Quote> for IndexQuote {
    fn from(quote: Quote) -> Self {
        Self {
            display_name: display_name(&quote.symbol).to_string(),
            path: encode_symbol(&quote.symbol),
            tradingview_url: tradingview_url(&quote.symbol),
            quote,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub indices: Vec<IndexQuote>,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct MarketState {
    indices: Vec<Quote>,
    refresh: RefreshState,
}

/// Market overview feed: the fixed index set, refreshed the same way as the
/// watchlist but never edited.
pub struct MarketOverview {
    gateway: Arc<dyn QuoteGateway>,
    cache: CacheStore,
    symbols: Vec<String>,
    state: Mutex<MarketState>,
}

impl MarketOverview {
    pub fn new(gateway: Arc<dyn QuoteGateway>, cache: CacheStore) -> Self {
        Self {
            gateway,
            cache,
            symbols: INDICES.iter().map(|s| s.to_string()).collect(),
            state: Mutex::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MarketState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> MarketSnapshot {
        let state = self.lock();
        MarketSnapshot {
            indices: state.indices.iter().cloned().map(IndexQuote::from).collect(),
            is_loading: state.refresh.is_loading(),
            error: state.refresh.error(),
        }
    }

    pub async fn load(&self) -> Result<(), GatewayError> {
        if let Some(cached) = self.cache.get::<Vec<Quote>>(MARKET_INDEX_KEY) {
            debug!(count = cached.len(), "market data served from cache");
            self.lock().indices = cached;
            return Ok(());
        }

        self.refresh().await
    }

    #[instrument(name = "market_refresh", skip(self))]
    pub async fn refresh(&self) -> Result<(), GatewayError> {
        let generation = self.lock().refresh.begin();

        let result = self.gateway.quotes(&self.symbols).await;

        let mut state = self.lock();
        match result {
            Ok(quotes) => {
                if !state.refresh.succeed(generation) {
                    debug!(generation, "discarding superseded market reply");
                    return Ok(());
                }
                state.indices = quotes.clone();
                drop(state);

                info!(count = quotes.len(), "market data refreshed");
                self.cache.set(MARKET_INDEX_KEY, &quotes);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "market refresh failed");
                state.refresh.fail(generation, "Failed to load market data".into());
                Err(e)
            }
        }
    }

    pub fn spawn_refresher(self: &Arc<Self>, period: Duration) -> PeriodicTask {
        let feed = Arc::clone(self);
        PeriodicTask::spawn("market", period, move || {
            let feed = Arc::clone(&feed);
            async move {
                let _ = feed.refresh().await;
            }
        })
    }
}
