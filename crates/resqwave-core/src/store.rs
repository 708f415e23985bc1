//! Persistence seam for cached forecasts

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use resqwave_db::{Database, DbError, WeatherCacheEntry, WeatherSnapshot};
use std::collections::HashMap;

/// Storage for weather cache entries, keyed by terminal
///
/// Implementations must keep at most one entry per terminal and make
/// `upsert` atomic: a concurrent `get` observes either the old entry or the
/// new one, never a mix.
#[async_trait]
pub trait WeatherCacheStore: Send + Sync {
    /// Get the entry for a terminal
    async fn get(&self, terminal_id: &str) -> Result<Option<WeatherCacheEntry>, DbError>;

    /// Insert or replace the entry, assigning its refresh count
    async fn upsert(&self, snapshot: WeatherSnapshot) -> Result<WeatherCacheEntry, DbError>;

    /// Record a read at `at`
    async fn touch(&self, terminal_id: &str, at: DateTime<Utc>) -> Result<(), DbError>;

    /// Number of cached entries
    async fn count(&self) -> Result<i64, DbError>;
}

#[async_trait]
impl WeatherCacheStore for Database {
    async fn get(&self, terminal_id: &str) -> Result<Option<WeatherCacheEntry>, DbError> {
        self.get_weather_cache(terminal_id).await
    }

    async fn upsert(&self, snapshot: WeatherSnapshot) -> Result<WeatherCacheEntry, DbError> {
        self.upsert_weather_cache(snapshot).await
    }

    async fn touch(&self, terminal_id: &str, at: DateTime<Utc>) -> Result<(), DbError> {
        self.touch_weather_cache(terminal_id, at).await?;
        Ok(())
    }

    async fn count(&self) -> Result<i64, DbError> {
        self.get_weather_cache_count().await
    }
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, WeatherCacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WeatherCacheStore for MemoryStore {
    async fn get(&self, terminal_id: &str) -> Result<Option<WeatherCacheEntry>, DbError> {
        Ok(self.entries.lock().get(terminal_id).cloned())
    }

    async fn upsert(&self, snapshot: WeatherSnapshot) -> Result<WeatherCacheEntry, DbError> {
        let mut entries = self.entries.lock();
        let refresh_count = entries
            .get(&snapshot.terminal_id)
            .map_or(1, |existing| existing.refresh_count + 1);
        let entry = snapshot.into_entry(refresh_count);
        entries.insert(entry.terminal_id.clone(), entry.clone());
        Ok(entry)
    }

    async fn touch(&self, terminal_id: &str, at: DateTime<Utc>) -> Result<(), DbError> {
        if let Some(entry) = self.entries.lock().get_mut(terminal_id) {
            entry.last_accessed_at = Some(at);
        }
        Ok(())
    }

    async fn count(&self) -> Result<i64, DbError> {
        Ok(self.entries.lock().len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[tokio::test]
    async fn test_memory_store_upsert_counts_refreshes() {
        let store = MemoryStore::new();
        let t0 = Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap();

        let first = store
            .upsert(WeatherSnapshot::new("T1", vec![], vec![], t0, Duration::hours(6)))
            .await
            .unwrap();
        assert_eq!(first.refresh_count, 1);

        let second = store
            .upsert(WeatherSnapshot::new(
                "T1",
                vec![],
                vec![],
                t0 + Duration::hours(7),
                Duration::hours(6),
            ))
            .await
            .unwrap();
        assert_eq!(second.refresh_count, 2);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_touch_missing_is_noop() {
        let store = MemoryStore::new();
        store.touch("T1", Utc::now()).await.unwrap();
        assert!(store.get("T1").await.unwrap().is_none());
    }
}
