mod history;
mod market;
mod search;
mod stocks;
mod watchlist;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/stocks", get(stocks::get_quotes))
        .route("/api/stocks/history", get(history::get_history))
        .route("/api/stocks/history/{range}", get(history::get_history_range))
        .route("/api/search", get(search::search))
        .route(
            "/api/watchlist",
            get(watchlist::get_watchlist).post(watchlist::add_symbol),
        )
        .route("/api/watchlist/refresh", post(watchlist::refresh))
        .route("/api/watchlist/{symbol}", delete(watchlist::remove_symbol))
        .route("/api/market", get(market::get_market))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}
