//! Session-state data models: cache entries, the current-word slot and
//! the stored credential.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{LexicalRecord, WordKey};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub record: LexicalRecord,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub cached_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWordSlot {
    pub word: WordKey,
    pub data: CacheEntry,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub token: String,
    pub user_id: String,
    pub email: String,
}

impl Credential {
    pub fn new(
        token: impl Into<String>,
        user_id: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            user_id: user_id.into(),
            email: email.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        [&self.token, &self.user_id, &self.email]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}
