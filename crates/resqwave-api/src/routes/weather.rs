//! Weather cache inspection routes

use axum::{Json, Router, extract::State, routing::get};
use chrono::{DateTime, Utc};
use resqwave_core::WeatherCacheStats;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Cache entry metadata, without the forecast payload
#[derive(Serialize)]
pub struct CacheEntryResponse {
    pub terminal_id: String,
    pub fresh: bool,
    pub fetched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub refresh_count: i64,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub hourly_points: usize,
    pub daily_summaries: usize,
}

/// Cache entries response
#[derive(Serialize)]
pub struct CacheEntriesResponse {
    pub entries: Vec<CacheEntryResponse>,
    pub total: usize,
}

/// GET /api/v1/weather/stats
async fn weather_stats(
    State(state): State<AppState>,
) -> Result<Json<WeatherCacheStats>, ApiError> {
    Ok(Json(state.weather.stats().await?))
}

/// GET /api/v1/weather/cache
async fn list_cache_entries(
    State(state): State<AppState>,
) -> Result<Json<CacheEntriesResponse>, ApiError> {
    let now = state.weather.now();
    let entries: Vec<CacheEntryResponse> = state
        .db
        .list_weather_cache_entries()
        .await?
        .into_iter()
        .map(|e| CacheEntryResponse {
            fresh: e.is_fresh_at(now),
            hourly_points: e.hourly_forecast.len(),
            daily_summaries: e.weekly_forecast.len(),
            terminal_id: e.terminal_id,
            fetched_at: e.fetched_at,
            expires_at: e.expires_at,
            refresh_count: e.refresh_count,
            last_accessed_at: e.last_accessed_at,
        })
        .collect();

    Ok(Json(CacheEntriesResponse {
        total: entries.len(),
        entries,
    }))
}

/// Create weather cache routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/weather/stats", get(weather_stats))
        .route("/api/v1/weather/cache", get(list_cache_entries))
}
