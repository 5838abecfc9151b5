//! Durable key/value storage shared by every part of the companion.
//!
//! [`KeyValueStore`] is the raw, fallible capability: SQLite in production
//! ([`crate::db::Database`]), a hash map in tests ([`MemoryStore`]).
//! [`Storage`] wraps a backend and never fails: errors are logged and turned
//! into safe defaults (`None` for reads, a no-op for writes), so losing a
//! cache entry can never crash the caller.

pub mod memory;

use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use log::{error, warn};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::LookupError;

pub use memory::MemoryStore;

pub mod keys {
    pub const AUTH_TOKEN: &str = "authToken";
    pub const USER_ID: &str = "userId";
    pub const USER_EMAIL: &str = "userEmail";
    pub const CURRENT_WORD: &str = "currentWord";
    pub const WORD_CACHE: &str = "wordCache";
    pub const SETTINGS: &str = "settings";
}

// Writers to the same key race with last-write-wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn get_many(&self, keys: &[&str]) -> Result<HashMap<String, Value>>;

    async fn set(&self, key: &str, value: Value) -> Result<()>;

    async fn set_many(&self, entries: HashMap<String, Value>) -> Result<()>;

    async fn remove(&self, keys: &[&str]) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}

#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn KeyValueStore>,
}

impl Storage {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = match self.backend.get(key).await {
            Ok(value) => value?,
            Err(err) => {
                error!("{}", LookupError::storage("get", key, &err));
                return None;
            }
        };

        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                warn!("Ignoring malformed value stored under '{key}': {err}");
                None
            }
        }
    }

    pub async fn get_many(&self, keys: &[&str]) -> HashMap<String, Value> {
        match self.backend.get_many(keys).await {
            Ok(values) => values,
            Err(err) => {
                error!("{}", LookupError::storage("get_many", keys.join(","), &err));
                HashMap::new()
            }
        }
    }

    pub async fn set<T: Serialize + Sync + ?Sized>(&self, key: &str, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(err) => {
                error!("Refusing to store unserializable value under '{key}': {err}");
                return;
            }
        };

        if let Err(err) = self.backend.set(key, value).await {
            error!("{}", LookupError::storage("set", key, &err));
        }
    }

    pub async fn set_many(&self, entries: HashMap<String, Value>) {
        let label = entries.keys().cloned().collect::<Vec<_>>().join(",");
        if let Err(err) = self.backend.set_many(entries).await {
            error!("{}", LookupError::storage("set_many", label, &err));
        }
    }

    pub async fn remove(&self, keys: &[&str]) {
        if let Err(err) = self.backend.remove(keys).await {
            error!("{}", LookupError::storage("remove", keys.join(","), &err));
        }
    }

    pub async fn clear(&self) {
        if let Err(err) = self.backend.clear().await {
            error!("{}", LookupError::storage("clear", "*", &err));
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::bail;
    use serde_json::json;

    /// Backend whose every operation fails, as on a full or locked disk.
    pub(crate) struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<Value>> {
            bail!("quota exceeded")
        }
        async fn get_many(&self, _keys: &[&str]) -> Result<HashMap<String, Value>> {
            bail!("quota exceeded")
        }
        async fn set(&self, _key: &str, _value: Value) -> Result<()> {
            bail!("quota exceeded")
        }
        async fn set_many(&self, _entries: HashMap<String, Value>) -> Result<()> {
            bail!("quota exceeded")
        }
        async fn remove(&self, _keys: &[&str]) -> Result<()> {
            bail!("quota exceeded")
        }
        async fn clear(&self) -> Result<()> {
            bail!("quota exceeded")
        }
    }

    #[tokio::test]
    async fn failing_backend_degrades_to_defaults() {
        let storage = Storage::new(Arc::new(BrokenStore));

        storage.set("settings", &json!({"autoDetect": false})).await;
        assert_eq!(storage.get::<Value>("settings").await, None);
        assert!(storage.get_many(&["a", "b"]).await.is_empty());
        storage.remove(&["settings"]).await;
        storage.clear().await;
    }

    #[tokio::test]
    async fn malformed_value_reads_as_absent() {
        let storage = Storage::in_memory();
        storage.set("currentWord", &json!("not an object")).await;

        let decoded: Option<HashMap<String, u32>> = storage.get("currentWord").await;
        assert!(decoded.is_none());
    }

    #[tokio::test]
    async fn typed_round_trip_through_facade() {
        let storage = Storage::in_memory();
        storage.set("userId", "u-42").await;

        assert_eq!(storage.get::<String>("userId").await.as_deref(), Some("u-42"));
    }
}
