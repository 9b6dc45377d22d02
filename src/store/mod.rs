//! Key-value storage contract for the device registry and history log.
//!
//! The core consumes storage through a minimal contract — point get, point
//! set, ordered prefix scan — and never assumes transactions, TTLs, or
//! secondary indexes. Two backends implement it:
//! - [`PgKvStore`] – durable, a single Postgres table (`kv_store`)
//! - [`MemoryStore`] – in-process, for tests and local demo runs
//!
//! Key layout (mirrors the upstream fleet service):
//! - `device:{id}`              – one [`crate::models::Device`] aggregate per device
//! - `history:{id}:{rfc3339us}` – one immutable telemetry snapshot per report
//!
//! Prefix scans return values in ascending key order, which for history keys
//! is chronological order (fixed-width RFC 3339 timestamps sort lexically).

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgKvStore;

// ---

/// Failures raised by a key-value backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing database rejected or failed the operation.
    #[error("key-value backend: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value no longer decodes into its expected shape.
    #[error("undecodable value at {key}: {reason}")]
    Decode {
        /// Key whose value failed to decode.
        key: String,
        /// Decoder message.
        reason: String,
    },
}

impl StoreError {
    // ---

    /// Build a `Decode` error for `key` from any serde failure.
    pub fn decode(key: impl Into<String>, err: serde_json::Error) -> Self {
        StoreError::Decode {
            key: key.into(),
            reason: err.to_string(),
        }
    }
}

/// Minimal get/set/prefix-scan storage contract.
///
/// `set` overwrites unconditionally (last write wins at the storage layer);
/// callers needing read-modify-write atomicity serialize above this trait —
/// see the per-device locks in [`crate::Registry`].
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch the value stored at `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Store `value` at `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Fetch every value whose key starts with `prefix`, ascending key order.
    async fn get_by_prefix(&self, prefix: &str) -> Result<Vec<Value>, StoreError>;
}
