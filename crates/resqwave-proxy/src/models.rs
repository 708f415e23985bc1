//! OpenWeatherMap forecast response types
//!
//! Only the fields the cache stores are modeled; the rest of the payload is
//! ignored during deserialization.

use serde::Deserialize;

/// Response body of `GET /forecast`
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    /// Forecast points at 3-hour steps, in chronological order
    pub list: Vec<ForecastItem>,
    #[serde(default)]
    pub city: Option<City>,
}

/// One 3-hour forecast step
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastItem {
    /// Unix timestamp (UTC) of the forecasted time
    pub dt: i64,
    pub main: MainReadings,
    #[serde(default)]
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub wind: Wind,
    /// Probability of precipitation, 0.0 to 1.0
    #[serde(default)]
    pub pop: f64,
    #[serde(default)]
    pub rain: Option<Precipitation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: f64,
    pub pressure: f64,
    pub humidity: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Condition {
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Wind {
    #[serde(default)]
    pub speed: f64,
}

/// Rain or snow volume for the last 3 hours
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Precipitation {
    #[serde(rename = "3h", default)]
    pub three_hours: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct City {
    pub name: String,
    #[serde(default)]
    pub timezone: i64,
}

impl ForecastItem {
    /// Primary weather condition, if the upstream reported one
    pub fn primary_condition(&self) -> Option<&Condition> {
        self.weather.first()
    }

    pub fn rain_mm(&self) -> f64 {
        self.rain.as_ref().map_or(0.0, |r| r.three_hours)
    }
}
