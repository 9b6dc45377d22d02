//! In-process key-value backend over an ordered map.
//!
//! Used by unit tests and by `STORE_DRIVER=memory` demo runs. A `BTreeMap`
//! keeps keys sorted, so prefix scans come back in the same ascending order
//! the Postgres backend produces.

use std::collections::BTreeMap;
use std::ops::Bound;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use super::{KvStore, StoreError};

// ---

/// Ordered in-memory store; cheap to construct per test.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    // ---

    /// New empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    // ---

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn get_by_prefix(&self, prefix: &str) -> Result<Vec<Value>, StoreError> {
        let entries = self.entries.lock().await;
        let values = entries
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(_, value)| value.clone())
            .collect();
        Ok(values)
    }
}
