//! ResQWave Core Business Logic
//!
//! This crate provides the weather cache for alert terminals: freshness
//! evaluation, per-terminal refresh coordination against the upstream
//! provider, and the forecast aggregation that feeds it.

pub mod cache;
pub mod clock;
pub mod error;
pub mod forecast;
pub mod provider;
pub mod store;
pub mod terminal;

pub use cache::{CacheConfig, ForecastOutcome, WeatherCacheManager, WeatherCacheStats};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::CoreError;
pub use forecast::ForecastBundle;
pub use provider::{ForecastProvider, TerminalForecastSource};
pub use store::{MemoryStore, WeatherCacheStore};
pub use terminal::{validate_coordinates, validate_terminal_id};
