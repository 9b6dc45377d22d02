//! Database schema management for `chamberflow`.
//!
//! Ensures the key-value table backing the device registry and history log
//! exists before serving requests. Applied once on startup from `main.rs`
//! (EMBP: single gateway call); skipped entirely under the memory driver.

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the `kv_store` table holding device aggregates (`device:{id}`)
/// and history snapshots (`history:{id}:{ts}`), plus a pattern-ops index so
/// prefix scans stay off sequential scans. Safe to call on every startup;
/// no-op if objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS kv_store (
            key        TEXT        PRIMARY KEY,
            value      JSONB       NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // text_pattern_ops makes `key LIKE 'history:{id}:%'` use the index
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_kv_store_key_prefix
            ON kv_store (key text_pattern_ops);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
