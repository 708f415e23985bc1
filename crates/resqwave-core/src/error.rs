//! Core error types

use std::sync::Arc;
use thiserror::Error;

/// Errors returned by the weather cache
///
/// `Clone` so that the result of one shared refresh can be handed to every
/// caller waiting on it; non-cloneable sources are kept behind `Arc`.
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    #[error("Invalid terminal identifier: {0}")]
    InvalidTerminal(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Store failure: {0}")]
    StoreFailure(Arc<resqwave_db::DbError>),

    #[error("Upstream error: {0}")]
    Upstream(Arc<resqwave_proxy::ProxyError>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Refresh task aborted: {0}")]
    RefreshAborted(String),
}

impl From<resqwave_db::DbError> for CoreError {
    fn from(e: resqwave_db::DbError) -> Self {
        match e {
            // The terminal went away while its forecast was being written
            resqwave_db::DbError::NotFound(msg) => CoreError::NotFound(msg),
            e => CoreError::StoreFailure(Arc::new(e)),
        }
    }
}

impl From<resqwave_proxy::ProxyError> for CoreError {
    fn from(e: resqwave_proxy::ProxyError) -> Self {
        CoreError::Upstream(Arc::new(e))
    }
}
