//! Database models

use crate::utils::parse_datetime;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;

/// One 3-hour forecast point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub time: DateTime<Utc>,
    /// Air temperature in °C
    pub temperature: f64,
    pub feels_like: f64,
    /// Relative humidity in percent
    pub humidity: u8,
    /// Sea-level pressure in hPa
    pub pressure: f64,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Probability of precipitation, 0.0 to 1.0
    pub precipitation_probability: f64,
    /// Rain volume over the 3-hour window in mm
    pub rain_mm: f64,
    pub condition: String,
    pub description: String,
    pub icon: String,
}

/// Daily forecast summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity_avg: f64,
    /// Highest probability of precipitation seen during the day
    pub precipitation_probability: f64,
    /// Total rain over the day in mm
    pub rain_mm: f64,
    pub wind_speed_max: f64,
    pub condition: String,
    pub description: String,
    pub icon: String,
}

/// Cached weather forecast for a single terminal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherCacheEntry {
    pub terminal_id: String,
    pub hourly_forecast: Vec<HourlyForecast>,
    pub weekly_forecast: Vec<DailyForecast>,
    pub fetched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Number of times this entry has been written, starting at 1
    pub refresh_count: i64,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl WeatherCacheEntry {
    /// Whether the entry may still be served without a refresh at `now`
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Freshly fetched forecast data ready to be written to the cache
///
/// `expires_at` is derived from `fetched_at` and the TTL at construction and
/// cannot be set on its own.
#[derive(Debug, Clone)]
pub struct WeatherSnapshot {
    pub terminal_id: String,
    pub hourly_forecast: Vec<HourlyForecast>,
    pub weekly_forecast: Vec<DailyForecast>,
    pub fetched_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    pub fn new(
        terminal_id: impl Into<String>,
        hourly_forecast: Vec<HourlyForecast>,
        weekly_forecast: Vec<DailyForecast>,
        fetched_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            terminal_id: terminal_id.into(),
            hourly_forecast,
            weekly_forecast,
            fetched_at,
            expires_at: fetched_at + ttl,
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Build the stored entry once the store has assigned a refresh count
    pub fn into_entry(self, refresh_count: i64) -> WeatherCacheEntry {
        WeatherCacheEntry {
            terminal_id: self.terminal_id,
            hourly_forecast: self.hourly_forecast,
            weekly_forecast: self.weekly_forecast,
            fetched_at: self.fetched_at,
            expires_at: self.expires_at,
            refresh_count,
            last_accessed_at: Some(self.fetched_at),
        }
    }
}

/// Alert terminal installed in a community
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Terminal {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New terminal (for insertion)
#[derive(Debug, Clone)]
pub struct NewTerminal {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

// ==================== TryFrom Implementations ====================

fn decode_json<T: serde::de::DeserializeOwned>(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<T, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    serde_json::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn decode_datetime(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<DateTime<Utc>, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    parse_datetime(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn decode_optional_datetime(
    row: &sqlx::sqlite::SqliteRow,
    column: &str,
) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|s| {
        parse_datetime(&s).map_err(|e| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        })
    })
    .transpose()
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for WeatherCacheEntry {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(WeatherCacheEntry {
            terminal_id: row.try_get("terminal_id")?,
            hourly_forecast: decode_json(row, "hourly_forecast")?,
            weekly_forecast: decode_json(row, "weekly_forecast")?,
            fetched_at: decode_datetime(row, "fetched_at")?,
            expires_at: decode_datetime(row, "expires_at")?,
            refresh_count: row.try_get("refresh_count")?,
            last_accessed_at: decode_optional_datetime(row, "last_accessed_at")?,
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Terminal {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(Terminal {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            latitude: row.try_get("latitude")?,
            longitude: row.try_get("longitude")?,
            created_at: decode_datetime(row, "created_at")?,
            updated_at: decode_datetime(row, "updated_at")?,
        })
    }
}
