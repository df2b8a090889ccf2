use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use stock::WatchlistError;
use thiserror::Error;

/// Errors surfaced to HTTP clients. Details stay in the logs; the body carries
/// a short generic message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Upstream(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<WatchlistError> for ApiError {
    fn from(err: WatchlistError) -> Self {
        match err {
            WatchlistError::EmptySymbol => ApiError::BadRequest("Symbol is required".into()),
            WatchlistError::InvalidSymbol(symbol) => {
                ApiError::BadRequest(format!("Unknown symbol: {symbol}"))
            }
            WatchlistError::Gateway(_) => ApiError::Upstream("Failed to fetch stock data".into()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
