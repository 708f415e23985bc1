//! Upstream forecast provider

use async_trait::async_trait;
use resqwave_db::Database;
use resqwave_proxy::OpenWeatherClient;
use std::sync::Arc;
use tracing::debug;

use crate::error::CoreError;
use crate::forecast::ForecastBundle;

/// Source of fresh forecast data for a terminal
///
/// Each call is one upstream request. The cache treats any error other than
/// `StoreFailure` as an upstream failure.
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    async fn fetch_forecast(&self, terminal_id: &str) -> Result<ForecastBundle, CoreError>;
}

/// Provider that resolves a terminal's location and asks OpenWeatherMap
pub struct TerminalForecastSource {
    db: Database,
    client: Arc<OpenWeatherClient>,
}

impl TerminalForecastSource {
    pub fn new(db: Database, client: Arc<OpenWeatherClient>) -> Self {
        Self { db, client }
    }
}

#[async_trait]
impl ForecastProvider for TerminalForecastSource {
    async fn fetch_forecast(&self, terminal_id: &str) -> Result<ForecastBundle, CoreError> {
        let terminal = self
            .db
            .get_terminal(terminal_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("terminal {}", terminal_id)))?;

        debug!(
            "Fetching forecast for terminal {} at ({}, {})",
            terminal.id, terminal.latitude, terminal.longitude
        );

        let response = self
            .client
            .get_forecast(terminal.latitude, terminal.longitude)
            .await?;

        Ok(ForecastBundle::from_response(&response))
    }
}
