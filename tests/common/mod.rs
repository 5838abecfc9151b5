#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use lexicard_lib::{
    api::CollectionResponse,
    error::Result,
    models::{Media, Meaning, PartOfSpeech, WordInfo},
    Credential, LexicalRecord, LexiconApi, LookupError, WordKey,
};

pub fn record_for(text: &str) -> LexicalRecord {
    LexicalRecord {
        flashcard_id: format!("fc-{text}"),
        word: WordInfo {
            id: format!("w-{text}"),
            text: text.to_string(),
            core_meaning: format!("meaning of {text}"),
            explanation: String::new(),
        },
        meanings: vec![Meaning {
            id: format!("m-{text}"),
            part_of_speech: PartOfSpeech::Noun,
            translation: "translation".into(),
            pronunciation: "/ˈsample/".into(),
            example_source: format!("An example with {text}."),
            example_translated: "translated example".into(),
        }],
        media: Media {
            id: format!("media-{text}"),
            urls: Vec::new(),
        },
    }
}

/// Scripted lexicon service shared by the integration tests.
#[derive(Default)]
pub struct ScriptedApi {
    pub offline: bool,
    pub fetches: AtomicUsize,
    pub adds: Mutex<Vec<(String, String)>>,
}

impl ScriptedApi {
    pub fn online() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn offline() -> Arc<Self> {
        Arc::new(Self {
            offline: true,
            ..Self::default()
        })
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LexiconApi for ScriptedApi {
    async fn fetch_word(&self, word: &WordKey) -> Result<LexicalRecord> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.offline {
            return Err(LookupError::Network("connection refused".into()));
        }
        Ok(record_for(word.as_str()))
    }

    async fn add_to_collection(
        &self,
        credential: &Credential,
        flashcard_id: &str,
    ) -> Result<CollectionResponse> {
        if self.offline {
            return Err(LookupError::Network("connection refused".into()));
        }
        self.adds
            .lock()
            .unwrap()
            .push((credential.user_id.clone(), flashcard_id.to_string()));
        Ok(CollectionResponse {
            success: true,
            message: None,
        })
    }
}
