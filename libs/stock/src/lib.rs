mod cache;
mod clock;
mod error;
mod gateway;
mod history;
mod market;
mod models;
mod poller;
mod quote_client;
mod refresh;
mod storage;
mod watchlist;

pub mod symbol;

pub use cache::{
    CACHE_DURATION, CacheEntry, CacheStore, MARKET_INDEX_KEY, WATCHLIST_DATA_KEY, WATCHLIST_KEY,
    history_key,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CacheError, GatewayError, WatchlistError};
pub use gateway::{QuoteGateway, equities_us_first};
pub use history::{HistoryRange, Interval, PriceSummary, RangePreset};
pub use market::{INDICES, IndexQuote, MarketOverview, MarketSnapshot};
pub use models::{PointTime, PricePoint, Quote, SearchResult};
pub use poller::{PeriodicTask, REFRESH_INTERVAL};
pub use quote_client::QuoteClient;
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use watchlist::{AddPolicy, WatchlistData, WatchlistManager, WatchlistSnapshot};
