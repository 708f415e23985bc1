//! Weather cache module

mod inflight;
mod manager;

pub use manager::{CacheConfig, ForecastOutcome, WeatherCacheManager, WeatherCacheStats};
