use thiserror::Error;

/// Failure talking to the quote provider. A batch either succeeds as a whole
/// or surfaces one of these.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    #[error("No data available for this time range")]
    NoData,

    #[error("{0}")]
    Upstream(String),
}

/// Storage-level failure. Never escapes [`crate::CacheStore`]; it is logged and
/// the operation degrades to a cache miss.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum WatchlistError {
    #[error("symbol must not be empty")]
    EmptySymbol,

    #[error("unknown symbol: {0}")]
    InvalidSymbol(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
