//! Postgres key-value backend.
//!
//! One table, `kv_store` (TEXT key, JSONB value), created on startup by
//! `schema::create_schema`. The upstream fleet service kept its devices in a
//! hosted Postgres KV table of the same shape, so this backend is
//! wire-compatible with that data.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

use super::{KvStore, StoreError};

// ---

/// Durable store over a `PgPool`.
pub struct PgKvStore {
    pool: PgPool,
}

impl PgKvStore {
    // ---

    /// Wrap an already-connected pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escape LIKE wildcards so a key prefix matches literally.
///
/// Device serials may legitimately contain `_`, which LIKE would otherwise
/// treat as a single-character wildcard.
fn escape_like(prefix: &str) -> String {
    // ---
    prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[async_trait]
impl KvStore for PgKvStore {
    // ---

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let value: Option<Value> =
            sqlx::query_scalar("SELECT value FROM kv_store WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (key) DO UPDATE
                SET value = EXCLUDED.value, updated_at = now()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_prefix(&self, prefix: &str) -> Result<Vec<Value>, StoreError> {
        let values: Vec<Value> = sqlx::query_scalar(
            r#"
            SELECT value FROM kv_store
            WHERE key LIKE $1 || '%'
            ORDER BY key
            "#,
        )
        .bind(escape_like(prefix))
        .fetch_all(&self.pool)
        .await?;

        Ok(values)
    }
}
