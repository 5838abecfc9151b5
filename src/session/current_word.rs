use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::{
    error::ErrorKind,
    models::{CacheEntry, CurrentWordSlot, WordKey},
    storage::{keys, Storage},
};

const EVENT_CAPACITY: usize = 32;

/// Push notifications for display surfaces.
///
/// Events are hints only: the persisted slot is authoritative and a reader
/// that lags or misses an event must re-read it with
/// [`CurrentWordStore::get_current`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WordEvent {
    Updated { word: WordKey },
    Cleared,
    LookupFailed {
        word: WordKey,
        kind: ErrorKind,
        message: String,
    },
}

#[derive(Clone)]
pub struct CurrentWordStore {
    storage: Storage,
    events: broadcast::Sender<WordEvent>,
}

impl CurrentWordStore {
    pub fn new(storage: Storage) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { storage, events }
    }

    pub async fn set_current(&self, word: WordKey, entry: CacheEntry) -> CurrentWordSlot {
        self.set_current_at(word, entry, Utc::now()).await
    }

    pub async fn set_current_at(
        &self,
        word: WordKey,
        entry: CacheEntry,
        observed_at: DateTime<Utc>,
    ) -> CurrentWordSlot {
        let slot = CurrentWordSlot {
            word,
            data: entry,
            observed_at,
        };
        self.storage.set(keys::CURRENT_WORD, &slot).await;
        self.publish(WordEvent::Updated {
            word: slot.word.clone(),
        });
        slot
    }

    pub async fn get_current(&self) -> Option<CurrentWordSlot> {
        self.storage.get(keys::CURRENT_WORD).await
    }

    pub async fn clear_current(&self) {
        self.storage.remove(&[keys::CURRENT_WORD]).await;
        self.publish(WordEvent::Cleared);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WordEvent> {
        self.events.subscribe()
    }

    pub fn publish(&self, event: WordEvent) {
        if self.events.send(event).is_err() {
            debug!("No display surface subscribed to word events");
        }
    }
}
