use async_trait::async_trait;

use crate::{
    error::GatewayError,
    history::HistoryRange,
    models::{PricePoint, Quote, SearchResult},
    symbol::is_us_exchange,
};

/// Remote source of live and historical prices.
#[async_trait]
pub trait QuoteGateway: Send + Sync {
    /// One batched request for every symbol; all-or-nothing.
    async fn quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, GatewayError>;

    async fn history(
        &self,
        symbol: &str,
        range: &HistoryRange,
    ) -> Result<Vec<PricePoint>, GatewayError>;

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, GatewayError>;
}

/// Keep equities only, US listings first, otherwise in provider order.
pub fn equities_us_first(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut equities: Vec<SearchResult> = results
        .into_iter()
        .filter(|r| r.kind == "EQUITY")
        .collect();

    equities.sort_by_key(|r| !is_us_exchange(&r.exchange));
    equities
}
