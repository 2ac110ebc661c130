//! `SQLite` implementation of [`RuleRepository`].
//!
//! The rule document is stored whole, as one JSON text row of the
//! `documents` table, so a save replaces it in a single statement.

use sqlx::SqlitePool;

use chime_app::ports::RuleRepository;
use chime_domain::error::ChimeError;
use chime_domain::rule::StoredRuleSet;

use crate::error::StorageError;

pub(crate) const RULES_KEY: &str = "automation_rules";

pub(crate) async fn read_document(
    pool: &SqlitePool,
    key: &str,
) -> Result<Option<String>, StorageError> {
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM documents WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(value,)| value))
}

pub(crate) async fn write_document(
    pool: &SqlitePool,
    key: &str,
    value: &str,
) -> Result<(), StorageError> {
    sqlx::query(
        "INSERT INTO documents (key, value, updated_at) VALUES (?, ?, ?) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
    )
    .bind(key)
    .bind(value)
    .bind(chime_domain::time::now().to_rfc3339())
    .execute(pool)
    .await?;
    Ok(())
}

/// `SQLite`-backed rule document repository.
pub struct SqliteRuleRepository {
    pool: SqlitePool,
}

impl SqliteRuleRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl RuleRepository for SqliteRuleRepository {
    async fn load(&self) -> Result<Option<StoredRuleSet>, ChimeError> {
        let Some(text) = read_document(&self.pool, RULES_KEY).await? else {
            return Ok(None);
        };
        let document = serde_json::from_str(&text).map_err(StorageError::from)?;
        Ok(Some(document))
    }

    async fn save(&self, rules: &StoredRuleSet) -> Result<(), ChimeError> {
        let text = serde_json::to_string(rules).map_err(StorageError::from)?;
        write_document(&self.pool, RULES_KEY, &text).await?;
        Ok(())
    }
}
