use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{
    clock::{Clock, SystemClock},
    storage::Storage,
};

/// How long a cache entry stays fresh.
pub const CACHE_DURATION: Duration = Duration::from_millis(60_000);

pub const WATCHLIST_KEY: &str = "watchlist";
pub const WATCHLIST_DATA_KEY: &str = "watchlistData";
pub const MARKET_INDEX_KEY: &str = "marketIndexData";

pub fn history_key(symbol: &str, range: &str) -> String {
    format!("stock_history_{symbol}_{range}")
}

/// Stored payload plus the epoch-millis at which it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    pub timestamp: i64,
}

/// Time-boxed JSON cache over a [`Storage`] backend.
///
/// Every failure (missing key, corrupt JSON, full disk) degrades to a miss or
/// a logged warning; callers never see an error.
#[derive(Clone)]
pub struct CacheStore {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    ttl_millis: i64,
}

impl CacheStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    pub fn with_clock(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            ttl_millis: CACHE_DURATION.as_millis() as i64,
        }
    }

    /// Fresh payload for `key`, or `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entry: CacheEntry<T> = self.read_json(key)?;

        // A timestamp from the future or beyond i64 range is as good as corrupt.
        match self.clock.now_millis().checked_sub(entry.timestamp) {
            Some(age) if (0..self.ttl_millis).contains(&age) => Some(entry.data),
            age => {
                debug!(key, age_ms = ?age, "cache entry stale");
                None
            }
        }
    }

    /// Store `value` stamped with the current time, replacing any prior entry.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        let entry = CacheEntry {
            data: value,
            timestamp: self.clock.now_millis(),
        };
        self.write_json(key, &entry);
    }

    /// Untimed read, for values that never expire (the symbol list).
    pub fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.storage.get_item(key)?;

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "error reading from cache");
                None
            }
        }
    }

    /// Untimed write. Failures are logged and swallowed.
    pub fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "error writing to cache");
                return;
            }
        };

        if let Err(e) = self.storage.set_item(key, raw) {
            warn!(key, error = %e, "error writing to cache");
        }
    }
}
