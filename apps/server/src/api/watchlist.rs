use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::Deserialize;
use stock::{WatchlistSnapshot, symbol::decode_symbol};
use tracing::{debug, info};

use crate::{
    AppState,
    error::{ApiError, ApiResult},
};

#[derive(Debug, Deserialize)]
pub struct AddSymbolBody {
    symbol: String,
}

pub async fn get_watchlist(State(state): State<Arc<AppState>>) -> Json<WatchlistSnapshot> {
    Json(state.watchlist.snapshot())
}

pub async fn add_symbol(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AddSymbolBody>, JsonRejection>,
) -> ApiResult<Json<WatchlistSnapshot>> {
    let Json(body) = body.map_err(|rejection| {
        debug!(error = %rejection, "unreadable add body");
        ApiError::BadRequest("Symbol is required".into())
    })?;
    let symbol = decode_symbol(&body.symbol);
    let added = state.watchlist.add(&symbol).await?;
    info!(symbol = %symbol, added, "watchlist add");
    Ok(Json(state.watchlist.snapshot()))
}

pub async fn remove_symbol(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Json<WatchlistSnapshot> {
    let symbol = decode_symbol(&symbol);
    let removed = state.watchlist.remove(&symbol);
    info!(symbol = %symbol, removed, "watchlist remove");
    Json(state.watchlist.snapshot())
}

pub async fn refresh(State(state): State<Arc<AppState>>) -> ApiResult<Json<WatchlistSnapshot>> {
    state.watchlist.refresh().await?;
    Ok(Json(state.watchlist.snapshot()))
}
