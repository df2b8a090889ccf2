use std::{
    str::FromStr,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::{
    cache::{CacheStore, WATCHLIST_DATA_KEY, WATCHLIST_KEY},
    error::WatchlistError,
    gateway::QuoteGateway,
    models::Quote,
    poller::PeriodicTask,
    refresh::RefreshState,
};

/// How `add` treats symbols the provider does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddPolicy {
    /// Validate against the provider first; unknown symbols are rejected.
    #[default]
    Strict,
    /// Append unconditionally, then refresh.
    Permissive,
}

impl FromStr for AddPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(AddPolicy::Strict),
            "permissive" => Ok(AddPolicy::Permissive),
            other => Err(format!("unknown add policy: {other}")),
        }
    }
}

/// Cached batch as stored under `watchlistData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistData {
    pub symbols: Vec<String>,
    pub data: Vec<Quote>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistSnapshot {
    pub symbols: Vec<String>,
    pub stocks: Vec<Quote>,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct WatchlistState {
    symbols: Vec<String>,
    stocks: Vec<Quote>,
    refresh: RefreshState,
}

/// Provider spellings may differ in case from what was stored.
fn same_symbol(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

impl WatchlistState {
    fn tracks(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| same_symbol(s, symbol))
    }

    /// Install a batch fetched for `requested`. Quotes for tracked symbols
    /// outside that batch are carried over; quotes for symbols no longer
    /// tracked are dropped. Result follows the symbol list order.
    fn install(&mut self, quotes: Vec<Quote>, requested: &[String]) {
        let carried = std::mem::take(&mut self.stocks)
            .into_iter()
            .filter(|q| !requested.iter().any(|s| same_symbol(s, &q.symbol)));

        let mut stocks: Vec<Quote> = quotes
            .into_iter()
            .chain(carried)
            .filter(|q| self.tracks(&q.symbol))
            .collect();
        stocks.sort_by_key(|q| self.symbols.iter().position(|s| same_symbol(s, &q.symbol)));

        self.stocks = stocks;
    }
}

/// Owns the user's ordered symbol list and the latest quote for each.
///
/// The symbol list is persisted on every change; quote batches go through the
/// time-boxed cache.
pub struct WatchlistManager {
    gateway: Arc<dyn QuoteGateway>,
    cache: CacheStore,
    policy: AddPolicy,
    state: Mutex<WatchlistState>,
}

impl WatchlistManager {
    /// Restore the persisted symbol list. Does not touch the network.
    pub fn new(gateway: Arc<dyn QuoteGateway>, cache: CacheStore, policy: AddPolicy) -> Self {
        let symbols: Vec<String> = cache.read_json(WATCHLIST_KEY).unwrap_or_default();
        info!(count = symbols.len(), "restored watchlist");

        Self {
            gateway,
            cache,
            policy,
            state: Mutex::new(WatchlistState {
                symbols,
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, WatchlistState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn symbols(&self) -> Vec<String> {
        self.lock().symbols.clone()
    }

    pub fn snapshot(&self) -> WatchlistSnapshot {
        let state = self.lock();
        WatchlistSnapshot {
            symbols: state.symbols.clone(),
            stocks: state.stocks.clone(),
            is_loading: state.refresh.is_loading(),
            error: state.refresh.error(),
        }
    }

    /// Serve a fresh cached batch if it covers exactly the current list,
    /// otherwise fetch.
    pub async fn load(&self) -> Result<(), WatchlistError> {
        let cached: Option<WatchlistData> = self.cache.get(WATCHLIST_DATA_KEY);

        {
            let mut state = self.lock();
            if let Some(cached) = cached.filter(|c| c.symbols == state.symbols) {
                debug!(count = cached.data.len(), "watchlist served from cache");
                state.install(cached.data, &cached.symbols);
                return Ok(());
            }
        }

        self.refresh().await
    }

    /// Re-fetch quotes for every tracked symbol in one batch. On failure the
    /// previous quotes stay in place.
    #[instrument(name = "watchlist_refresh", skip(self))]
    pub async fn refresh(&self) -> Result<(), WatchlistError> {
        let (generation, symbols) = {
            let mut state = self.lock();
            if state.symbols.is_empty() {
                state.stocks.clear();
                state.refresh.reset();
                return Ok(());
            }
            (state.refresh.begin(), state.symbols.clone())
        };

        let result = self.gateway.quotes(&symbols).await;

        let mut state = self.lock();
        match result {
            Ok(quotes) => {
                if !state.refresh.succeed(generation) {
                    debug!(generation, "discarding superseded watchlist reply");
                    return Ok(());
                }
                state.install(quotes.clone(), &symbols);
                drop(state);

                info!(count = quotes.len(), "watchlist refreshed");
                self.cache.set(
                    WATCHLIST_DATA_KEY,
                    &WatchlistData {
                        symbols,
                        data: quotes,
                    },
                );
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "watchlist refresh failed");
                state.refresh.fail(generation, "Failed to fetch stock data".into());
                Err(e.into())
            }
        }
    }

    /// Track `symbol`. Returns `false` if it was already tracked.
    #[instrument(name = "watchlist_add", skip(self))]
    pub async fn add(&self, symbol: &str) -> Result<bool, WatchlistError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(WatchlistError::EmptySymbol);
        }

        match self.policy {
            AddPolicy::Permissive => {
                if !self.append(symbol.to_string()) {
                    return Ok(false);
                }
                self.refresh().await?;
                Ok(true)
            }
            AddPolicy::Strict => self.add_validated(symbol).await,
        }
    }

    async fn add_validated(&self, symbol: &str) -> Result<bool, WatchlistError> {
        let (generation, mut candidate) = {
            let mut state = self.lock();
            if state.tracks(symbol) {
                debug!("already watched");
                return Ok(false);
            }
            (state.refresh.begin(), state.symbols.clone())
        };
        candidate.push(symbol.to_string());

        let result = self.gateway.quotes(&candidate).await;

        let mut state = self.lock();
        let quotes = match result {
            Ok(quotes) => quotes,
            Err(e) => {
                warn!(error = %e, "validation fetch failed");
                state.refresh.fail(generation, "Failed to fetch stock data".into());
                return Err(e.into());
            }
        };

        // The provider's spelling wins, so "aapl" is stored as "AAPL".
        let Some(canonical) = quotes
            .iter()
            .find(|q| q.symbol.eq_ignore_ascii_case(symbol))
            .map(|q| q.symbol.clone())
        else {
            state.refresh.abandon();
            warn!("provider returned no quote, rejecting");
            return Err(WatchlistError::InvalidSymbol(symbol.to_string()));
        };

        if state.tracks(&canonical) {
            state.refresh.abandon();
            debug!(canonical = %canonical, "already watched");
            return Ok(false);
        }

        state.symbols.push(canonical.clone());
        let symbols = state.symbols.clone();
        if let Some(last) = candidate.last_mut() {
            *last = canonical.clone();
        }

        let applied = state.refresh.succeed(generation);
        if applied {
            state.install(quotes.clone(), &candidate);
        } else {
            // A newer batch landed first but was issued without this symbol.
            let fresh: Vec<Quote> = quotes
                .iter()
                .filter(|q| same_symbol(&q.symbol, &canonical))
                .cloned()
                .collect();
            debug!(canonical = %canonical, "merging new quote into newer batch");
            state.install(fresh, std::slice::from_ref(&canonical));
        }
        drop(state);

        self.cache.write_json(WATCHLIST_KEY, &symbols);
        if applied {
            self.cache.set(
                WATCHLIST_DATA_KEY,
                &WatchlistData {
                    symbols: candidate,
                    data: quotes,
                },
            );
        }

        info!(symbol = %canonical, count = symbols.len(), "added to watchlist");
        Ok(true)
    }

    fn append(&self, symbol: String) -> bool {
        let symbols = {
            let mut state = self.lock();
            if state.tracks(&symbol) {
                debug!(symbol = %symbol, "already watched");
                return false;
            }
            state.symbols.push(symbol);
            state.symbols.clone()
        };

        self.cache.write_json(WATCHLIST_KEY, &symbols);
        true
    }

    /// Stop tracking `symbol`. Returns `false` if it was not tracked.
    pub fn remove(&self, symbol: &str) -> bool {
        let symbols = {
            let mut state = self.lock();
            let before = state.symbols.len();
            state.symbols.retain(|s| !same_symbol(s, symbol));
            if state.symbols.len() == before {
                return false;
            }
            state.stocks.retain(|q| !same_symbol(&q.symbol, symbol));
            state.symbols.clone()
        };

        self.cache.write_json(WATCHLIST_KEY, &symbols);
        info!(symbol, count = symbols.len(), "removed from watchlist");
        true
    }

    /// Refresh every `period` until the returned task is stopped or dropped.
    pub fn spawn_refresher(self: &Arc<Self>, period: Duration) -> PeriodicTask {
        let manager = Arc::clone(self);
        PeriodicTask::spawn("watchlist", period, move || {
            let manager = Arc::clone(&manager);
            async move {
                // Failure is already recorded in the snapshot; the next tick retries.
                let _ = manager.refresh().await;
            }
        })
    }
}
