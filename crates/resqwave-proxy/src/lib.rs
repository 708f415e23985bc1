//! ResQWave Upstream Weather Client
//!
//! This crate provides the client for the OpenWeatherMap 5-day / 3-hour
//! forecast API, which supplies the forecasts cached per terminal.

pub mod client;
pub mod error;
pub mod models;

pub use client::{OpenWeatherClient, OpenWeatherConfig};
pub use error::ProxyError;
pub use models::{ForecastItem, ForecastResponse};
