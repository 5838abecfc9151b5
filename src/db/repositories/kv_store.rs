use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use serde_json::Value;

use crate::{db::Database, storage::KeyValueStore};

fn decode(key: &str, raw: &str) -> Result<Value> {
    serde_json::from_str(raw).with_context(|| format!("value under '{key}' is not valid JSON"))
}

impl Database {
    pub async fn kv_get(&self, key: &str) -> Result<Option<Value>> {
        let key = key.to_string();
        self.execute(move |conn| {
            let raw: Option<String> = conn
                .query_row(
                    "SELECT value FROM kv_store WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()
                .with_context(|| format!("failed to read key '{key}'"))?;

            raw.map(|raw| decode(&key, &raw)).transpose()
        })
        .await
    }

    pub async fn kv_get_many(&self, keys: &[&str]) -> Result<HashMap<String, Value>> {
        let keys: Vec<String> = keys.iter().map(|key| key.to_string()).collect();
        self.execute(move |conn| {
            let mut stmt = conn.prepare("SELECT value FROM kv_store WHERE key = ?1")?;
            let mut found = HashMap::new();
            for key in keys {
                let raw: Option<String> = stmt
                    .query_row(params![key], |row| row.get(0))
                    .optional()
                    .with_context(|| format!("failed to read key '{key}'"))?;
                if let Some(raw) = raw {
                    let value = decode(&key, &raw)?;
                    found.insert(key, value);
                }
            }
            Ok(found)
        })
        .await
    }

    /// Writes every entry in one transaction.
    pub async fn kv_set_many(&self, entries: HashMap<String, Value>) -> Result<()> {
        let updated_at = Utc::now().to_rfc3339();
        self.execute(move |conn| {
            let tx = conn
                .transaction()
                .context("failed to open kv write transaction")?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO kv_store (key, value, updated_at)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET
                         value = excluded.value,
                         updated_at = excluded.updated_at",
                )?;
                for (key, value) in entries {
                    let raw = serde_json::to_string(&value)?;
                    stmt.execute(params![key, raw, updated_at])
                        .with_context(|| format!("failed to write key '{key}'"))?;
                }
            }
            tx.commit().context("failed to commit kv write")?;
            Ok(())
        })
        .await
    }

    pub async fn kv_remove(&self, keys: &[&str]) -> Result<()> {
        let keys: Vec<String> = keys.iter().map(|key| key.to_string()).collect();
        self.execute(move |conn| {
            let tx = conn
                .transaction()
                .context("failed to open kv delete transaction")?;
            for key in &keys {
                tx.execute("DELETE FROM kv_store WHERE key = ?1", params![key])
                    .with_context(|| format!("failed to delete key '{key}'"))?;
            }
            tx.commit().context("failed to commit kv delete")?;
            Ok(())
        })
        .await
    }

    pub async fn kv_clear(&self) -> Result<()> {
        self.execute(|conn| {
            conn.execute("DELETE FROM kv_store", [])
                .context("failed to clear kv store")?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl KeyValueStore for Database {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        self.kv_get(key).await
    }

    async fn get_many(&self, keys: &[&str]) -> Result<HashMap<String, Value>> {
        self.kv_get_many(keys).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.kv_set_many(HashMap::from([(key.to_string(), value)]))
            .await
    }

    async fn set_many(&self, entries: HashMap<String, Value>) -> Result<()> {
        self.kv_set_many(entries).await
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        self.kv_remove(keys).await
    }

    async fn clear(&self) -> Result<()> {
        self.kv_clear().await
    }
}
