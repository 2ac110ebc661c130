//! `SQLite` implementation of [`HistoryRepository`].
//!
//! The execution log is a JSON array kept in the `documents` table. Usage
//! counters live in `usage_stats`, one row per counter key, and are replaced
//! inside a transaction.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use chime_app::ports::HistoryRepository;
use chime_domain::error::ChimeError;
use chime_domain::history::{ExecutionLog, UsageStats};

use crate::error::StorageError;
use crate::rule_repo::{read_document, write_document};

const LOG_KEY: &str = "execution_log";

struct Counter(String, serde_json::Value);

impl<'r> FromRow<'r, SqliteRow> for Counter {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let key: String = row.try_get("key")?;
        let value: String = row.try_get("value")?;
        let value =
            serde_json::from_str(&value).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        Ok(Self(key, value))
    }
}

/// `SQLite`-backed execution log and usage statistics.
pub struct SqliteHistoryRepository {
    pool: SqlitePool,
}

impl SqliteHistoryRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl HistoryRepository for SqliteHistoryRepository {
    async fn load_log(&self) -> Result<ExecutionLog, ChimeError> {
        let Some(text) = read_document(&self.pool, LOG_KEY).await? else {
            return Ok(ExecutionLog::default());
        };
        match serde_json::from_str(&text) {
            Ok(log) => Ok(log),
            Err(err) => {
                // a damaged log is history, not state worth failing over
                tracing::warn!(%err, "discarding unreadable execution log");
                Ok(ExecutionLog::default())
            }
        }
    }

    async fn replace_log(&self, log: &ExecutionLog) -> Result<(), ChimeError> {
        let text = serde_json::to_string(log).map_err(StorageError::from)?;
        write_document(&self.pool, LOG_KEY, &text).await?;
        Ok(())
    }

    async fn load_stats(&self) -> Result<UsageStats, ChimeError> {
        let rows: Vec<Counter> = sqlx::query_as("SELECT key, value FROM usage_stats")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(UsageStats::from_entries(
            rows.into_iter().map(|Counter(key, value)| (key, value)),
        ))
    }

    async fn replace_stats(&self, stats: &UsageStats) -> Result<(), ChimeError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        sqlx::query("DELETE FROM usage_stats")
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        for (key, value) in stats.to_entries() {
            sqlx::query("INSERT INTO usage_stats (key, value) VALUES (?, ?)")
                .bind(&key)
                .bind(value.to_string())
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
        }
        tx.commit().await.map_err(StorageError::from)?;
        Ok(())
    }
}
