use std::sync::Arc;

use axum::{Json, extract::State};
use stock::MarketSnapshot;

use crate::AppState;

pub async fn get_market(State(state): State<Arc<AppState>>) -> Json<MarketSnapshot> {
    Json(state.market.snapshot())
}
