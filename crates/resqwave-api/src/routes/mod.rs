//! API routes

mod forecast;
mod health;
pub mod metrics;
mod terminals;
mod weather;

use axum::Router;
use std::sync::Arc;

use crate::state::{AppState, MetricsHandle};

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let mut router = Router::new()
        // Health check
        .merge(health::routes())
        // Forecast reads through the weather cache
        .merge(forecast::routes())
        // Terminal registry
        .merge(terminals::routes())
        // Cache inspection
        .merge(weather::routes())
        .with_state(state);

    // Add metrics endpoint if handle is provided
    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
}
