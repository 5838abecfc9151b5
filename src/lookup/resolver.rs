use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
    time,
};
use uuid::Uuid;

use crate::{
    api::LexiconApi,
    error::Result,
    lookup::WordCache,
    models::{CacheEntry, LexicalRecord, WordKey},
    session::{CurrentWordStore, WordEvent},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ResolutionState {
    #[default]
    Idle,
    CheckingCache,
    Fetching,
    Resolved,
    Errored,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ResolutionSource {
    Cache,
    Remote,
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub request_id: String,
    pub word: WordKey,
    pub source: ResolutionSource,
    pub attempts: u32,
    pub record: LexicalRecord,
    /// False when a newer request superseded this one before it finished,
    /// in which case the current-word slot was left alone.
    pub applied: bool,
}

/// Turns detected words into lexical records, via the cache or the remote
/// service, and publishes the outcome to the current-word slot.
///
/// Every request is tagged with a generation number. Results of a request
/// that is no longer the newest are still cached but never written to the
/// slot, so a slow lookup cannot overwrite a word the user moved on to.
#[derive(Clone)]
pub struct WordResolver {
    api: Arc<dyn LexiconApi>,
    cache: WordCache,
    current: CurrentWordStore,
    config: ResolverConfig,
    latest_request: Arc<AtomicU64>,
    apply_lock: Arc<Mutex<()>>,
    state: Arc<watch::Sender<ResolutionState>>,
}

impl WordResolver {
    pub fn new(
        api: Arc<dyn LexiconApi>,
        cache: WordCache,
        current: CurrentWordStore,
        config: ResolverConfig,
    ) -> Self {
        let (state, _) = watch::channel(ResolutionState::Idle);
        Self {
            api,
            cache,
            current,
            config,
            latest_request: Arc::new(AtomicU64::new(0)),
            apply_lock: Arc::new(Mutex::new(())),
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> ResolutionState {
        *self.state.borrow()
    }

    /// Fire-and-forget entry point for the detection pipeline. Completion is
    /// observed through the current-word slot and its events.
    pub fn spawn_resolve(&self, word: WordKey) -> JoinHandle<Result<Resolution>> {
        let resolver = self.clone();
        tokio::spawn(async move { resolver.resolve(word.as_str()).await })
    }

    pub async fn resolve(&self, raw: &str) -> Result<Resolution> {
        let word = WordKey::parse(raw)?;
        let generation = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
        let request_id = format!("res_{}", Uuid::new_v4());

        self.transition(generation, ResolutionState::CheckingCache);
        if let Some(entry) = self.cache.entry_at(&word, Utc::now()).await {
            log_info!("[{request_id}] cache hit for '{word}'");
            let record = entry.record.clone();
            let applied = self.apply(generation, &word, entry).await;
            self.transition(generation, ResolutionState::Resolved);
            return Ok(Resolution {
                request_id,
                word,
                source: ResolutionSource::Cache,
                attempts: 0,
                record,
                applied,
            });
        }

        self.transition(generation, ResolutionState::Fetching);
        match self.fetch_with_retry(&word, &request_id).await {
            Ok((record, attempts)) => {
                let entry = self.cache.set_cached(&word, record.clone()).await;
                let applied = self.apply(generation, &word, entry).await;
                self.transition(generation, ResolutionState::Resolved);
                log_info!("[{request_id}] resolved '{word}' after {attempts} attempt(s)");
                Ok(Resolution {
                    request_id,
                    word,
                    source: ResolutionSource::Remote,
                    attempts,
                    record,
                    applied,
                })
            }
            Err(err) => {
                if self.is_latest(generation) {
                    self.current.publish(WordEvent::LookupFailed {
                        word: word.clone(),
                        kind: err.kind(),
                        message: err.to_string(),
                    });
                }
                self.transition(generation, ResolutionState::Errored);
                Err(err)
            }
        }
    }

    async fn fetch_with_retry(
        &self,
        word: &WordKey,
        request_id: &str,
    ) -> Result<(LexicalRecord, u32)> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.api.fetch_word(word).await {
                Ok(record) => return Ok((record, attempt)),
                Err(err) if attempt < max_attempts => {
                    let delay = self.config.base_delay * attempt;
                    log_warn!(
                        "[{request_id}] attempt {attempt}/{max_attempts} for '{word}' failed: {err}; retrying in {}ms",
                        delay.as_millis()
                    );
                    time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    log_error!("[{request_id}] giving up on '{word}' after {attempt} attempt(s): {err}");
                    return Err(err);
                }
            }
        }
    }

    async fn apply(&self, generation: u64, word: &WordKey, entry: CacheEntry) -> bool {
        let _guard = self.apply_lock.lock().await;
        if !self.is_latest(generation) {
            log_info!("Discarding superseded result for '{word}'");
            return false;
        }
        self.current.set_current(word.clone(), entry).await;
        true
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.latest_request.load(Ordering::SeqCst) == generation
    }

    fn transition(&self, generation: u64, state: ResolutionState) {
        if self.is_latest(generation) {
            self.state.send_replace(state);
        }
    }
}
