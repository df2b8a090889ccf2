use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use stock::{Quote, symbol::decode_symbol};
use tracing::{error, info};

use crate::{
    AppState,
    error::{ApiError, ApiResult},
};

#[derive(Debug, Deserialize)]
pub struct QuotesParams {
    symbols: Option<String>,
}

/// `GET /api/stocks?symbols=AAPL,MSFT`
pub async fn get_quotes(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QuotesParams>,
) -> ApiResult<Json<Vec<Quote>>> {
    let symbols: Vec<String> = params
        .symbols
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(|s| decode_symbol(s.trim()))
        .filter(|s| !s.is_empty())
        .collect();

    if symbols.is_empty() {
        return Err(ApiError::BadRequest("No symbols provided".into()));
    }

    info!(count = symbols.len(), symbols = %symbols.join(","), "quotes requested");

    match state.gateway.quotes(&symbols).await {
        Ok(quotes) => Ok(Json(quotes)),
        Err(e) => {
            error!(error = %e, "quote fetch failed");
            Err(ApiError::Upstream("Failed to fetch stock data".into()))
        }
    }
}
