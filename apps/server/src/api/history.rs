use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use stock::{
    GatewayError, HistoryRange, PricePoint, PriceSummary, QuoteGateway, RangePreset, history_key,
    symbol::decode_symbol,
};
use tracing::{debug, error};

use crate::{
    AppState,
    error::{ApiError, ApiResult},
};

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    symbol: Option<String>,
    period1: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryView {
    range: &'static str,
    points: Vec<PricePoint>,
    summary: Option<PriceSummary>,
}

fn required_symbol(raw: Option<&str>) -> ApiResult<String> {
    let symbol = decode_symbol(raw.unwrap_or_default().trim());
    if symbol.is_empty() {
        return Err(ApiError::BadRequest("Symbol is required".into()));
    }
    Ok(symbol)
}

fn history_failed(symbol: &str, e: GatewayError) -> ApiError {
    error!(symbol, error = %e, "historical data fetch failed");
    ApiError::Upstream("Failed to fetch historical data".into())
}

async fn fetch_points(
    gateway: &dyn QuoteGateway,
    symbol: &str,
    range: &HistoryRange,
) -> Result<Vec<PricePoint>, GatewayError> {
    let points = gateway.history(symbol, range).await?;
    if points.is_empty() {
        return Err(GatewayError::NoData);
    }
    Ok(points)
}

/// `GET /api/stocks/history?symbol=^GSPC&period1=2024-01-01T00:00:00Z`
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryParams>,
) -> ApiResult<Json<Vec<PricePoint>>> {
    let symbol = required_symbol(params.symbol.as_deref())?;

    let range = HistoryRange::resolve(params.period1.as_deref(), Utc::now())
        .map_err(|e| history_failed(&symbol, e))?;

    let points = fetch_points(state.gateway.as_ref(), &symbol, &range)
        .await
        .map_err(|e| history_failed(&symbol, e))?;

    Ok(Json(points))
}

/// `GET /api/stocks/history/1M?symbol=AAPL`, served from the cache while fresh.
pub async fn get_history_range(
    State(state): State<Arc<AppState>>,
    Path(range): Path<String>,
    Query(params): Query<HistoryParams>,
) -> ApiResult<Json<HistoryView>> {
    let preset: RangePreset = range.parse().map_err(ApiError::BadRequest)?;
    let symbol = required_symbol(params.symbol.as_deref())?;
    let key = history_key(&symbol, preset.as_str());

    let points = match state.cache.get::<Vec<PricePoint>>(&key) {
        Some(points) => {
            debug!(key = %key, "history served from cache");
            points
        }
        None => {
            let range = preset.range_ending(Utc::now());
            let points = fetch_points(state.gateway.as_ref(), &symbol, &range)
                .await
                .map_err(|e| history_failed(&symbol, e))?;
            state.cache.set(&key, &points);
            points
        }
    };

    Ok(Json(HistoryView {
        range: preset.as_str(),
        summary: PriceSummary::from_points(&points),
        points,
    }))
}
