//! Weather cache operations

use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::error::DbError;
use crate::utils::format_datetime;
use crate::models::{WeatherCacheEntry, WeatherSnapshot};
use crate::repository::Database;

impl Database {
    // ==================== Weather Cache Operations ====================

    /// Get the cached forecast for a terminal
    pub async fn get_weather_cache(
        &self,
        terminal_id: &str,
    ) -> Result<Option<WeatherCacheEntry>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT terminal_id, hourly_forecast, weekly_forecast, fetched_at, expires_at, refresh_count, last_accessed_at
            FROM weather_cache
            WHERE terminal_id = ?
            "#,
        )
        .bind(terminal_id)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| WeatherCacheEntry::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// Insert or replace the cached forecast for a registered terminal
    ///
    /// The write is a single statement: readers see either the previous row or
    /// the new one. `refresh_count` starts at 1 and is incremented by the
    /// database on every replacement. Nothing is written if the terminal is
    /// not (or no longer) registered.
    pub async fn upsert_weather_cache(
        &self,
        snapshot: WeatherSnapshot,
    ) -> Result<WeatherCacheEntry, DbError> {
        let hourly = serde_json::to_string(&snapshot.hourly_forecast)?;
        let weekly = serde_json::to_string(&snapshot.weekly_forecast)?;

        let result = sqlx::query(
            r#"
            INSERT INTO weather_cache (terminal_id, hourly_forecast, weekly_forecast, fetched_at, expires_at, refresh_count, last_accessed_at)
            SELECT ?, ?, ?, ?, ?, 1, ?
            WHERE EXISTS (SELECT 1 FROM terminals WHERE id = ?)
            ON CONFLICT(terminal_id) DO UPDATE SET
                hourly_forecast = excluded.hourly_forecast,
                weekly_forecast = excluded.weekly_forecast,
                fetched_at = excluded.fetched_at,
                expires_at = excluded.expires_at,
                refresh_count = weather_cache.refresh_count + 1,
                last_accessed_at = excluded.last_accessed_at
            RETURNING refresh_count
            "#,
        )
        .bind(&snapshot.terminal_id)
        .bind(hourly)
        .bind(weekly)
        .bind(format_datetime(&snapshot.fetched_at))
        .bind(format_datetime(&snapshot.expires_at()))
        .bind(format_datetime(&snapshot.fetched_at))
        .bind(&snapshot.terminal_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            DbError::NotFound(format!("Terminal '{}' not found", snapshot.terminal_id))
        })?;

        let refresh_count: i64 = result.get("refresh_count");
        Ok(snapshot.into_entry(refresh_count))
    }

    /// Record a read of the cached forecast
    pub async fn touch_weather_cache(
        &self,
        terminal_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE weather_cache
            SET last_accessed_at = ?
            WHERE terminal_id = ?
            "#,
        )
        .bind(format_datetime(&at))
        .bind(terminal_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List all cached forecasts, soonest expiry first
    pub async fn list_weather_cache_entries(&self) -> Result<Vec<WeatherCacheEntry>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT terminal_id, hourly_forecast, weekly_forecast, fetched_at, expires_at, refresh_count, last_accessed_at
            FROM weather_cache
            ORDER BY expires_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| WeatherCacheEntry::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Get weather cache entry count
    pub async fn get_weather_cache_count(&self) -> Result<i64, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM weather_cache")
            .fetch_one(&self.pool)
            .await?;
        Ok(result.get("count"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailyForecast, HourlyForecast, NewTerminal};
    use chrono::{Duration, NaiveDate, TimeZone};

    fn hourly(temperature: f64) -> HourlyForecast {
        HourlyForecast {
            time: Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap(),
            temperature,
            feels_like: temperature + 2.0,
            humidity: 85,
            pressure: 1008.0,
            wind_speed: 4.5,
            precipitation_probability: 0.8,
            rain_mm: 3.2,
            condition: "Rain".to_string(),
            description: "moderate rain".to_string(),
            icon: "10d".to_string(),
        }
    }

    fn daily() -> DailyForecast {
        DailyForecast {
            date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            temp_min: 24.0,
            temp_max: 31.0,
            humidity_avg: 80.0,
            precipitation_probability: 0.9,
            rain_mm: 12.5,
            wind_speed_max: 7.0,
            condition: "Rain".to_string(),
            description: "moderate rain".to_string(),
            icon: "10d".to_string(),
        }
    }

    fn snapshot(terminal_id: &str, fetched_at: DateTime<Utc>, temperature: f64) -> WeatherSnapshot {
        WeatherSnapshot::new(
            terminal_id,
            vec![hourly(temperature)],
            vec![daily()],
            fetched_at,
            Duration::hours(6),
        )
    }

    async fn memory_db() -> Database {
        Database::new("sqlite::memory:").await.unwrap()
    }

    async fn register(db: &Database, id: &str) {
        db.insert_terminal(NewTerminal {
            id: id.to_string(),
            name: format!("Terminal {}", id),
            latitude: 14.7566,
            longitude: 121.0447,
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_upsert_creates_then_increments() {
        let db = memory_db().await;
        register(&db, "T1").await;
        let t0 = Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap();

        let created = db.upsert_weather_cache(snapshot("T1", t0, 28.0)).await.unwrap();
        assert_eq!(created.refresh_count, 1);
        assert_eq!(created.expires_at, t0 + Duration::hours(6));

        let t1 = t0 + Duration::hours(7);
        let replaced = db.upsert_weather_cache(snapshot("T1", t1, 30.0)).await.unwrap();
        assert_eq!(replaced.refresh_count, 2);

        let stored = db.get_weather_cache("T1").await.unwrap().unwrap();
        assert_eq!(stored, replaced);
        assert_eq!(stored.hourly_forecast[0].temperature, 30.0);
        assert_eq!(db.get_weather_cache_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_touch_updates_last_accessed() {
        let db = memory_db().await;
        register(&db, "T1").await;
        let t0 = Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap();
        db.upsert_weather_cache(snapshot("T1", t0, 28.0)).await.unwrap();

        let later = t0 + Duration::minutes(30);
        assert!(db.touch_weather_cache("T1", later).await.unwrap());
        assert!(!db.touch_weather_cache("missing", later).await.unwrap());

        let stored = db.get_weather_cache("T1").await.unwrap().unwrap();
        assert_eq!(stored.last_accessed_at, Some(later));
        assert_eq!(stored.refresh_count, 1);
    }

    #[tokio::test]
    async fn test_delete_terminal_cascades_to_cache() {
        let db = memory_db().await;
        register(&db, "T1").await;
        register(&db, "T2").await;
        let t0 = Utc::now();
        db.upsert_weather_cache(snapshot("T1", t0, 28.0)).await.unwrap();
        db.upsert_weather_cache(snapshot("T2", t0, 28.0)).await.unwrap();

        assert!(db.delete_terminal("T1").await.unwrap());
        assert!(db.get_terminal("T1").await.unwrap().is_none());
        assert!(db.get_weather_cache("T1").await.unwrap().is_none());
        assert!(db.get_weather_cache("T2").await.unwrap().is_some());

        assert!(!db.delete_terminal("T1").await.unwrap());
    }

    #[tokio::test]
    async fn test_upsert_skips_unregistered_terminal() {
        let db = memory_db().await;
        let t0 = Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap();

        let err = db.upsert_weather_cache(snapshot("ghost", t0, 28.0)).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
        assert!(db.get_weather_cache("ghost").await.unwrap().is_none());

        // A refresh finishing after its terminal was deleted leaves nothing behind
        register(&db, "T1").await;
        db.upsert_weather_cache(snapshot("T1", t0, 28.0)).await.unwrap();
        assert!(db.delete_terminal("T1").await.unwrap());

        let late = snapshot("T1", t0 + Duration::minutes(1), 29.0);
        let err = db.upsert_weather_cache(late).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
        assert!(db.get_weather_cache("T1").await.unwrap().is_none());
        assert_eq!(db.get_weather_cache_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_timestamp_is_a_decode_error() {
        let db = memory_db().await;
        register(&db, "T1").await;
        let t0 = Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap();
        db.upsert_weather_cache(snapshot("T1", t0, 28.0)).await.unwrap();

        sqlx::query("UPDATE weather_cache SET expires_at = 'not-a-date' WHERE terminal_id = ?")
            .bind("T1")
            .execute(db.pool())
            .await
            .unwrap();

        let err = db.get_weather_cache("T1").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Connection(sqlx::Error::ColumnDecode { .. })
        ));
        assert!(db.list_weather_cache_entries().await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_terminal_rejected() {
        let db = memory_db().await;
        let terminal = NewTerminal {
            id: "T1".to_string(),
            name: "Barangay 171".to_string(),
            latitude: 14.7566,
            longitude: 121.0447,
        };
        db.insert_terminal(terminal.clone()).await.unwrap();

        let err = db.insert_terminal(terminal).await.unwrap_err();
        assert!(matches!(err, DbError::Duplicate(_)));
        assert_eq!(db.list_terminals().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_orders_by_expiry() {
        let db = memory_db().await;
        register(&db, "late").await;
        register(&db, "early").await;
        let t0 = Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap();
        db.upsert_weather_cache(snapshot("late", t0 + Duration::hours(2), 28.0))
            .await
            .unwrap();
        db.upsert_weather_cache(snapshot("early", t0, 28.0)).await.unwrap();

        let ids: Vec<String> = db
            .list_weather_cache_entries()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.terminal_id)
            .collect();
        assert_eq!(ids, vec!["early".to_string(), "late".to_string()]);
    }

    #[tokio::test]
    async fn test_on_disk_database_persists_between_connections() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}?mode=rwc", dir.path().join("resqwave.db").display());
        let t0 = Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap();

        {
            let db = Database::new(&url).await.unwrap();
            register(&db, "T1").await;
            db.upsert_weather_cache(snapshot("T1", t0, 28.0)).await.unwrap();
            db.pool().close().await;
        }

        let db = Database::new(&url).await.unwrap();
        let stored = db.get_weather_cache("T1").await.unwrap().unwrap();
        assert_eq!(stored.fetched_at, t0);
        assert_eq!(stored.weekly_forecast, vec![daily()]);
    }
}
