//! Weather cache manager implementation

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use resqwave_db::{DailyForecast, HourlyForecast, WeatherCacheEntry, WeatherSnapshot};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::inflight::{Attach, InFlightRegistry, RefreshResult};
use crate::clock::Clock;
use crate::error::CoreError;
use crate::forecast::ForecastBundle;
use crate::provider::ForecastProvider;
use crate::store::WeatherCacheStore;
use crate::terminal::validate_terminal_id;

/// Configuration for the weather cache manager
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a fetched forecast is served without a refresh
    pub ttl: Duration,
    /// Upper bound on a single upstream fetch
    pub refresh_timeout: std::time::Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(6),
            refresh_timeout: std::time::Duration::from_secs(15),
        }
    }
}

/// Forecast served to a caller
///
/// `fresh` is false only when the upstream failed and an expired entry was
/// served instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastOutcome {
    pub terminal_id: String,
    pub fresh: bool,
    pub hourly_forecast: Vec<HourlyForecast>,
    pub weekly_forecast: Vec<DailyForecast>,
    pub fetched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub refresh_count: i64,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl ForecastOutcome {
    fn from_entry(entry: WeatherCacheEntry, fresh: bool) -> Self {
        Self {
            terminal_id: entry.terminal_id,
            fresh,
            hourly_forecast: entry.hourly_forecast,
            weekly_forecast: entry.weekly_forecast,
            fetched_at: entry.fetched_at,
            expires_at: entry.expires_at,
            refresh_count: entry.refresh_count,
            last_accessed_at: entry.last_accessed_at,
        }
    }

    /// The forecast data without cache metadata
    pub fn bundle(&self) -> ForecastBundle {
        ForecastBundle {
            hourly_forecast: self.hourly_forecast.clone(),
            weekly_forecast: self.weekly_forecast.clone(),
        }
    }
}

/// Weather cache statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeatherCacheStats {
    pub entry_count: i64,
    /// Reads served from a fresh entry
    pub fresh_hits: u64,
    /// Successful upstream refreshes
    pub refreshes: u64,
    /// Callers that waited on a refresh started by another caller
    pub coalesced: u64,
    /// Expired entries served after an upstream failure
    pub stale_served: u64,
    pub upstream_failures: u64,
    /// Refreshes running right now (not persisted)
    #[serde(default)]
    pub in_flight: usize,
}

/// Cache manager serving per-terminal forecasts
///
/// Cloning is cheap; clones share the store, the provider and the in-flight
/// registry.
#[derive(Clone)]
pub struct WeatherCacheManager {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn WeatherCacheStore>,
    provider: Arc<dyn ForecastProvider>,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
    in_flight: Arc<InFlightRegistry>,
    stats: RwLock<WeatherCacheStats>,
}

impl WeatherCacheManager {
    /// Create a new weather cache manager
    pub fn new(
        store: Arc<dyn WeatherCacheStore>,
        provider: Arc<dyn ForecastProvider>,
        clock: Arc<dyn Clock>,
        config: CacheConfig,
    ) -> Self {
        info!(
            "Initializing weather cache manager (ttl: {} minutes, refresh timeout: {:?})",
            config.ttl.num_minutes(),
            config.refresh_timeout
        );

        Self {
            inner: Arc::new(Inner {
                store,
                provider,
                clock,
                config,
                in_flight: Arc::new(InFlightRegistry::default()),
                stats: RwLock::new(WeatherCacheStats::default()),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Current time according to the cache's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }

    /// Get the forecast for a terminal, refreshing it from upstream if needed
    ///
    /// Returns fresh data, expired data tagged `fresh: false` when the
    /// upstream fails, or `UpstreamUnavailable` when there is nothing cached
    /// to fall back to.
    pub async fn get_forecast(&self, terminal_id: &str) -> Result<ForecastOutcome, CoreError> {
        validate_terminal_id(terminal_id)?;

        let now = self.inner.clock.now();
        if let Some(entry) = self.inner.store.get(terminal_id).await? {
            if entry.is_fresh_at(now) {
                return self.inner.serve(entry, now, true).await;
            }
            debug!(
                "Cached forecast for {} expired at {}",
                terminal_id, entry.expires_at
            );
        }

        self.refresh(terminal_id).await
    }

    /// Get the cached entry without refreshing or recording an access
    pub async fn peek(&self, terminal_id: &str) -> Result<Option<WeatherCacheEntry>, CoreError> {
        validate_terminal_id(terminal_id)?;
        Ok(self.inner.store.get(terminal_id).await?)
    }

    /// Number of refreshes currently running
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.len()
    }

    /// Get cache statistics
    pub async fn stats(&self) -> Result<WeatherCacheStats, CoreError> {
        let mut stats = self.inner.stats.read().clone();
        stats.entry_count = self.inner.store.count().await?;
        stats.in_flight = self.in_flight();

        Ok(stats)
    }

    /// Start or join the refresh for a terminal and wait for its result
    async fn refresh(&self, terminal_id: &str) -> Result<ForecastOutcome, CoreError> {
        let inner = Arc::clone(&self.inner);
        let key = terminal_id.to_string();

        let attach = self.inner.in_flight.attach(terminal_id, move || async move {
            inner.run_refresh(&key).await
        });

        let refresh = match attach {
            Attach::Started(refresh) => {
                debug!("Started refresh for {}", terminal_id);
                refresh
            }
            Attach::Joined(refresh) => {
                debug!("Joined in-flight refresh for {}", terminal_id);
                self.inner.record(|s| s.coalesced += 1);
                metrics::counter!("resqwave_weather_coalesced_total").increment(1);
                refresh
            }
        };

        refresh.await
    }
}

impl Inner {
    /// Record an access and hand the entry to the caller
    async fn serve(
        &self,
        mut entry: WeatherCacheEntry,
        now: DateTime<Utc>,
        fresh: bool,
    ) -> Result<ForecastOutcome, CoreError> {
        self.store.touch(&entry.terminal_id, now).await?;
        entry.last_accessed_at = Some(now);

        if fresh {
            self.record(|s| s.fresh_hits += 1);
            metrics::counter!("resqwave_weather_fresh_hits_total").increment(1);
        } else {
            self.record(|s| s.stale_served += 1);
            metrics::counter!("resqwave_weather_stale_served_total").increment(1);
        }

        Ok(ForecastOutcome::from_entry(entry, fresh))
    }

    /// Body of the refresh task; runs at most once at a time per terminal
    async fn run_refresh(&self, terminal_id: &str) -> RefreshResult {
        let existing = self.store.get(terminal_id).await?;

        // A refresh that finished between the caller's read and this task
        // starting has already done the work.
        let now = self.clock.now();
        if let Some(entry) = &existing
            && entry.is_fresh_at(now)
        {
            return self.serve(entry.clone(), now, true).await;
        }

        let fetched = tokio::time::timeout(
            self.config.refresh_timeout,
            self.provider.fetch_forecast(terminal_id),
        )
        .await;

        let failure = match fetched {
            Ok(Ok(bundle)) => {
                let fetched_at = self.clock.now();
                let snapshot = WeatherSnapshot::new(
                    terminal_id,
                    bundle.hourly_forecast,
                    bundle.weekly_forecast,
                    fetched_at,
                    self.config.ttl,
                );
                let entry = self.store.upsert(snapshot).await?;

                self.record(|s| s.refreshes += 1);
                metrics::counter!("resqwave_weather_refreshes_total").increment(1);
                info!(
                    "Refreshed forecast for {} (refresh #{}, expires {})",
                    terminal_id, entry.refresh_count, entry.expires_at
                );

                return Ok(ForecastOutcome::from_entry(entry, true));
            }
            // The provider shares the store; its failures are not upstream ones
            Ok(Err(e @ CoreError::StoreFailure(_))) => return Err(e),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("timed out after {:?}", self.config.refresh_timeout),
        };

        self.record(|s| s.upstream_failures += 1);
        metrics::counter!("resqwave_weather_upstream_failures_total").increment(1);

        match existing {
            Some(entry) => {
                warn!(
                    "Upstream refresh for {} failed ({}), serving forecast fetched at {}",
                    terminal_id, failure, entry.fetched_at
                );
                self.serve(entry, self.clock.now(), false).await
            }
            None => {
                warn!(
                    "Upstream refresh for {} failed ({}), nothing cached",
                    terminal_id, failure
                );
                Err(CoreError::UpstreamUnavailable(format!(
                    "{}: {}",
                    terminal_id, failure
                )))
            }
        }
    }

    fn record(&self, update: impl FnOnce(&mut WeatherCacheStats)) {
        update(&mut self.stats.write());
    }
}
