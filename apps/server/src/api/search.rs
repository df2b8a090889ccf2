use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use stock::{SearchResult, equities_us_first};
use tracing::{debug, error};

use crate::{
    AppState,
    error::{ApiError, ApiResult},
};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
}

/// `GET /api/search?q=apple`
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<SearchResult>>> {
    let query = params.q.as_deref().unwrap_or_default().trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest("Search query is required".into()));
    }

    match state.gateway.search(query).await {
        Ok(results) => {
            let results = equities_us_first(results);
            debug!(query, returned = results.len(), "search complete");
            Ok(Json(results))
        }
        Err(e) => {
            error!(query, error = %e, "search failed");
            Err(ApiError::Upstream("Failed to search stocks".into()))
        }
    }
}
