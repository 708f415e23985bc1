//! Forecast read endpoint

use axum::{
    Json, Router,
    extract::{Path, State},
    http::HeaderValue,
    response::{IntoResponse, Response},
    routing::get,
};
use resqwave_core::validate_terminal_id;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Header telling clients whether the body came from a fresh or an expired entry
pub const CACHE_STATUS_HEADER: &str = "x-cache";

/// GET /api/v1/terminals/{id}/forecast
async fn get_forecast(
    State(state): State<AppState>,
    Path(terminal_id): Path<String>,
) -> Result<Response, ApiError> {
    validate_terminal_id(&terminal_id)?;

    if state.db.get_terminal(&terminal_id).await?.is_none() {
        return Err(ApiError::NotFound(format!(
            "Terminal '{}' not found",
            terminal_id
        )));
    }

    let outcome = state.weather.get_forecast(&terminal_id).await?;
    debug!(
        "Serving forecast for {} (fresh: {}, fetched at {})",
        terminal_id, outcome.fresh, outcome.fetched_at
    );

    let cache_status = if outcome.fresh { "fresh" } else { "stale" };
    let mut response = Json(outcome).into_response();
    response
        .headers_mut()
        .insert(CACHE_STATUS_HEADER, HeaderValue::from_static(cache_status));

    Ok(response)
}

/// Create forecast routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/v1/terminals/{id}/forecast", get(get_forecast))
}
