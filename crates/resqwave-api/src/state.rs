//! Application state

use resqwave_core::WeatherCacheManager;
use resqwave_db::Database;

/// Prometheus handle rendered by the `/metrics` route
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub weather: WeatherCacheManager,
}

impl AppState {
    pub fn new(db: Database, weather: WeatherCacheManager) -> Self {
        Self { db, weather }
    }
}
