//! API error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use resqwave_core::CoreError;
use resqwave_db::DbError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::Core(e) => match e {
                CoreError::InvalidTerminal(msg) => {
                    (StatusCode::BAD_REQUEST, "INVALID_TERMINAL", msg.clone())
                }
                CoreError::InvalidCoordinates(msg) => {
                    (StatusCode::BAD_REQUEST, "INVALID_COORDINATES", msg.clone())
                }
                CoreError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
                CoreError::UpstreamUnavailable(_) | CoreError::Upstream(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "UPSTREAM_UNAVAILABLE",
                    e.to_string(),
                ),
                CoreError::StoreFailure(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_FAILURE",
                    e.to_string(),
                ),
                CoreError::RefreshAborted(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    e.to_string(),
                ),
            },
            ApiError::Database(e) => match e {
                DbError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
                DbError::Duplicate(msg) => (StatusCode::CONFLICT, "DUPLICATE", msg.clone()),
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    e.to_string(),
                ),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::warn!("Request failed with {}: {}", status, message);
        }

        let body = axum::Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
