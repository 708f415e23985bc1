//! ResQWave weather REST API
//!
//! This crate provides the Axum-based HTTP API in front of the weather cache:
//! forecast reads, the terminal registry and cache inspection.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
