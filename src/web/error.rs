use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::ZoneError;
use crate::feed::FeedError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    /// The payload was understood but cannot be applied.
    #[error("feed rejected: {0}")]
    Rejected(String),

    #[error("invalid feed: {0}")]
    BadRequest(String),
}

impl From<FeedError> for ApiError {
    fn from(value: FeedError) -> Self {
        match value {
            FeedError::Zone(err) => ApiError::Rejected(err.to_string()),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<ZoneError> for ApiError {
    fn from(value: ZoneError) -> Self {
        ApiError::Rejected(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };
        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });
        (status, axum::Json(body)).into_response()
    }
}
