use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{
    models::{CacheEntry, LexicalRecord, WordKey},
    storage::{keys, Storage},
};

/// Freshness window of a cached record, in milliseconds.
pub const CACHE_TTL_MS: i64 = 3_600_000;

pub fn cache_ttl() -> Duration {
    Duration::milliseconds(CACHE_TTL_MS)
}

type CacheMap = HashMap<WordKey, CacheEntry>;

/// Word → record cache persisted as one serialized map under `wordCache`.
///
/// Expiry is lazy: a stale entry is ignored on read but stays stored until
/// [`WordCache::evict_expired`] rebuilds the map.
///
/// Writes are a read-modify-write of the whole map. Writers sharing this
/// handle are serialized, but two processes (or two `WordCache`s built over
/// the same store) that finish resolutions at the same moment can still lose
/// one of the entries: both read the map before either writes it back.
#[derive(Clone)]
pub struct WordCache {
    storage: Storage,
    ttl: Duration,
    write_lock: Arc<Mutex<()>>,
}

impl WordCache {
    pub fn new(storage: Storage) -> Self {
        Self::with_ttl(storage, cache_ttl())
    }

    pub fn with_ttl(storage: Storage, ttl: Duration) -> Self {
        Self {
            storage,
            ttl,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn get_cached(&self, key: &WordKey) -> Option<LexicalRecord> {
        self.get_cached_at(key, Utc::now()).await
    }

    pub async fn get_cached_at(&self, key: &WordKey, now: DateTime<Utc>) -> Option<LexicalRecord> {
        self.entry_at(key, now).await.map(|entry| entry.record)
    }

    pub async fn entry_at(&self, key: &WordKey, now: DateTime<Utc>) -> Option<CacheEntry> {
        let mut map = self.load().await;
        let entry = map.remove(key)?;
        if self.is_fresh(&entry, now) {
            Some(entry)
        } else {
            debug!("Cache entry for '{key}' expired at {}", entry.cached_at + self.ttl);
            None
        }
    }

    pub async fn set_cached(&self, key: &WordKey, record: LexicalRecord) -> CacheEntry {
        self.set_cached_at(key, record, Utc::now()).await
    }

    pub async fn set_cached_at(
        &self,
        key: &WordKey,
        record: LexicalRecord,
        now: DateTime<Utc>,
    ) -> CacheEntry {
        let entry = CacheEntry {
            record,
            cached_at: now,
        };

        let _guard = self.write_lock.lock().await;
        let mut map = self.load().await;
        map.insert(key.clone(), entry.clone());
        self.storage.set(keys::WORD_CACHE, &map).await;
        entry
    }

    pub async fn evict_expired(&self) -> usize {
        self.evict_expired_at(Utc::now()).await
    }

    pub async fn evict_expired_at(&self, now: DateTime<Utc>) -> usize {
        let _guard = self.write_lock.lock().await;
        let map = self.load().await;
        let before = map.len();
        let kept: CacheMap = map
            .into_iter()
            .filter(|(_, entry)| self.is_fresh(entry, now))
            .collect();
        let removed = before - kept.len();

        if removed > 0 {
            self.storage.set(keys::WORD_CACHE, &kept).await;
            info!("Evicted {removed} expired cache entries ({} remain)", kept.len());
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.load().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(entry.cached_at) < self.ttl
    }

    // Decoded per entry: one bad entry must not empty the map.
    async fn load(&self) -> CacheMap {
        let raw: HashMap<String, Value> =
            self.storage.get(keys::WORD_CACHE).await.unwrap_or_default();

        raw.into_iter()
            .filter_map(|(key, value)| {
                let Ok(word) = WordKey::parse(&key) else {
                    warn!("Dropping cache entry under invalid key '{key}'");
                    return None;
                };
                match serde_json::from_value::<CacheEntry>(value) {
                    Ok(entry) => Some((word, entry)),
                    Err(err) => {
                        warn!("Dropping undecodable cache entry '{key}': {err}");
                        None
                    }
                }
            })
            .collect()
    }
}
