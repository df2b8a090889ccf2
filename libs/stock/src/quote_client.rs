use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, USER_AGENT},
};
use serde::Deserialize;
use tracing::{debug, instrument};
use urlencoding::encode;

use crate::{
    error::GatewayError,
    gateway::QuoteGateway,
    history::{HistoryRange, Interval},
    models::{PricePoint, Quote, SearchResult},
};

const DEFAULT_BASE_API: &str = "https://query1.finance.yahoo.com";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const BROWSER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const SEARCH_QUOTES_COUNT: &str = "20";

/// [`QuoteGateway`] backed by the Yahoo Finance public HTTP API.
#[derive(Clone)]
pub struct QuoteClient {
    client: Client,
    base_api: String,
}

impl QuoteClient {
    pub fn new(base_api: String, timeout: Duration) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(BROWSER_AGENT)?);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base_api })
    }

    /// Reads `QUOTE_API_BASE_URL` and `QUOTE_API_TIMEOUT_MS`, both optional.
    pub fn from_env() -> Result<Self, GatewayError> {
        let base_api =
            std::env::var("QUOTE_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_API.to_string());
        let timeout_ms = std::env::var("QUOTE_API_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        Self::new(base_api, Duration::from_millis(timeout_ms))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_api.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl QuoteGateway for QuoteClient {
    #[instrument(name = "gateway_quotes", skip(self), fields(count = symbols.len()))]
    async fn quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, GatewayError> {
        let res: QuoteEnvelope = self
            .client
            .get(self.endpoint("/v7/finance/quote"))
            .query(&[("symbols", symbols.join(","))])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let quotes: Vec<Quote> = res
            .quote_response
            .result
            .into_iter()
            .map(Quote::from)
            .collect();

        debug!(returned = quotes.len(), "fetched quotes");
        Ok(quotes)
    }

    #[instrument(name = "gateway_history", skip(self, range), fields(interval = range.interval.as_str()))]
    async fn history(
        &self,
        symbol: &str,
        range: &HistoryRange,
    ) -> Result<Vec<PricePoint>, GatewayError> {
        let url = self.endpoint(&format!("/v8/finance/chart/{}", encode(symbol)));

        let res: ChartEnvelope = self
            .client
            .get(url)
            .query(&[
                ("period1", range.start.timestamp().to_string()),
                ("period2", range.end.timestamp().to_string()),
                ("interval", range.interval.as_str().to_string()),
                ("includePrePost", "true".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = res.chart.error {
            return Err(GatewayError::Upstream(err.to_string()));
        }

        let result = res
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or(GatewayError::NoData)?;

        let points = result.into_points(range.interval);
        debug!(points = points.len(), "fetched history");
        Ok(points)
    }

    #[instrument(name = "gateway_search", skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, GatewayError> {
        let res: SearchEnvelope = self
            .client
            .get(self.endpoint("/v1/finance/search"))
            .query(&[
                ("q", query),
                ("quotesCount", SEARCH_QUOTES_COUNT),
                ("newsCount", "0"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(res.quotes.into_iter().map(SearchResult::from).collect())
    }
}

//
// Match Yahoo Finance JSON
// Everything the provider may omit is optional here and defaulted on conversion.
//
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteEnvelope {
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    result: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooQuote {
    symbol: String,
    regular_market_price: Option<f64>,
    regular_market_change: Option<f64>,
    regular_market_change_percent: Option<f64>,
}

impl From<YahooQuote> for Quote {
    fn from(q: YahooQuote) -> Self {
        Quote {
            symbol: q.symbol,
            price: q.regular_market_price.unwrap_or_default(),
            change: q.regular_market_change.unwrap_or_default(),
            change_percent: q.regular_market_change_percent.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

impl ChartResult {
    fn into_points(self, interval: Interval) -> Vec<PricePoint> {
        let closes = self
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();

        self.timestamp
            .into_iter()
            .zip(closes)
            .filter_map(|(ts, close)| {
                close.map(|value| PricePoint {
                    time: interval.point_time(ts),
                    value,
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    quotes: Vec<YahooSearchQuote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooSearchQuote {
    symbol: Option<String>,
    #[serde(rename = "shortname")]
    short_name: Option<String>,
    #[serde(rename = "longname")]
    long_name: Option<String>,
    exchange: Option<String>,
    quote_type: Option<String>,
}

impl From<YahooSearchQuote> for SearchResult {
    fn from(q: YahooSearchQuote) -> Self {
        SearchResult {
            symbol: q.symbol.unwrap_or_default(),
            name: q.short_name.or(q.long_name).unwrap_or_default(),
            exchange: q.exchange.unwrap_or_default(),
            kind: q.quote_type.unwrap_or_default(),
        }
    }
}
