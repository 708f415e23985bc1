//! OpenWeatherMap upstream client

use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::error::ProxyError;
use crate::models::ForecastResponse;

/// OpenWeatherMap client configuration
#[derive(Clone, Debug)]
pub struct OpenWeatherConfig {
    /// Base URL of the API, e.g. `https://api.openweathermap.org/data/2.5`
    pub base_url: String,
    /// API key sent as the `appid` query parameter
    pub api_key: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Unit system: "metric", "imperial" or "standard"
    pub units: String,
}

/// OpenWeatherMap API client
pub struct OpenWeatherClient {
    config: OpenWeatherConfig,
    client: Client,
}

impl OpenWeatherClient {
    /// Create a new OpenWeatherMap client
    pub fn new(config: OpenWeatherConfig) -> Result<Self, ProxyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        info!("Created OpenWeatherMap client for {}", config.base_url);

        Ok(Self { config, client })
    }

    /// Build the forecast URL for a coordinate pair
    fn forecast_url(&self, latitude: f64, longitude: f64) -> Result<Url, ProxyError> {
        let base = self.config.base_url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{}/forecast", base))?;
        url.query_pairs_mut()
            .append_pair("lat", &latitude.to_string())
            .append_pair("lon", &longitude.to_string())
            .append_pair("units", &self.config.units)
            .append_pair("appid", &self.config.api_key);
        Ok(url)
    }

    /// Fetch the 5-day / 3-hour forecast for a location
    pub async fn get_forecast(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<ForecastResponse, ProxyError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(ProxyError::InvalidCoordinates {
                latitude,
                longitude,
            });
        }

        let url = self.forecast_url(latitude, longitude)?;
        debug!("Fetching forecast for ({}, {})", latitude, longitude);

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ProxyError::Unauthorized);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProxyError::RateLimited);
        }

        if !status.is_success() {
            return Err(ProxyError::UpstreamError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body = response.bytes().await?;
        let forecast: ForecastResponse = serde_json::from_slice(&body)
            .map_err(|e| ProxyError::InvalidResponse(e.to_string()))?;

        if forecast.list.is_empty() {
            return Err(ProxyError::InvalidResponse(
                "Forecast contains no data points".to_string(),
            ));
        }

        debug!("Received {} forecast points", forecast.list.len());
        Ok(forecast)
    }
}
