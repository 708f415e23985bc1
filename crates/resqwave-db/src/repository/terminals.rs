//! Terminal registry operations

use chrono::Utc;

use crate::error::DbError;
use crate::utils::format_datetime;
use crate::models::{NewTerminal, Terminal};
use crate::repository::Database;

impl Database {
    // ==================== Terminal Operations ====================

    /// Register a new terminal
    pub async fn insert_terminal(&self, terminal: NewTerminal) -> Result<Terminal, DbError> {
        let now = Utc::now();

        if self.get_terminal(&terminal.id).await?.is_some() {
            return Err(DbError::Duplicate(format!(
                "Terminal '{}' already exists",
                terminal.id
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO terminals (id, name, latitude, longitude, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&terminal.id)
        .bind(&terminal.name)
        .bind(terminal.latitude)
        .bind(terminal.longitude)
        .bind(format_datetime(&now))
        .bind(format_datetime(&now))
        .execute(&self.pool)
        .await?;

        Ok(Terminal {
            id: terminal.id,
            name: terminal.name,
            latitude: terminal.latitude,
            longitude: terminal.longitude,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a terminal by ID
    pub async fn get_terminal(&self, id: &str) -> Result<Option<Terminal>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, name, latitude, longitude, created_at, updated_at
            FROM terminals
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| Terminal::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// List all terminals ordered by ID
    pub async fn list_terminals(&self) -> Result<Vec<Terminal>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, latitude, longitude, created_at, updated_at
            FROM terminals
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Terminal::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Delete a terminal together with its cached forecast
    pub async fn delete_terminal(&self, id: &str) -> Result<bool, DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM weather_cache WHERE terminal_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM terminals WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
