use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::{CollectionResponse, LexiconApi};
use crate::{
    error::{LookupError, Result},
    models::{word::tests::sample_record, Credential, LexicalRecord, WordKey},
};

/// In-process stand-in for the lexicon service with scripted failures.
#[derive(Default)]
pub(crate) struct FakeApi {
    failures_before_success: Mutex<Option<usize>>,
    fetch_calls: AtomicUsize,
    mutation_calls: AtomicUsize,
    mutation_result: Mutex<Option<Result<CollectionResponse>>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl FakeApi {
    pub(crate) fn succeeding() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn always_failing() -> Arc<Self> {
        let api = Self::default();
        *api.failures_before_success.lock().unwrap() = Some(usize::MAX);
        Arc::new(api)
    }

    pub(crate) fn failing_times(failures: usize) -> Arc<Self> {
        let api = Self::default();
        *api.failures_before_success.lock().unwrap() = Some(failures);
        Arc::new(api)
    }

    pub(crate) fn with_mutation_result(self: Arc<Self>, result: Result<CollectionResponse>) -> Arc<Self> {
        *self.mutation_result.lock().unwrap() = Some(result);
        self
    }

    /// Holds fetches of `word` until the returned handle is notified.
    pub(crate) fn gate(&self, word: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(word.to_string(), notify.clone());
        notify
    }

    pub(crate) fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn mutation_calls(&self) -> usize {
        self.mutation_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LexiconApi for FakeApi {
    async fn fetch_word(&self, word: &WordKey) -> Result<LexicalRecord> {
        let call = self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gates.lock().unwrap().get(word.as_str()).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let failures = self.failures_before_success.lock().unwrap().unwrap_or(0);
        if call < failures {
            return Err(LookupError::Network("connection refused".into()));
        }
        Ok(sample_record(word.as_str()))
    }

    async fn add_to_collection(
        &self,
        _credential: &Credential,
        _flashcard_id: &str,
    ) -> Result<CollectionResponse> {
        self.mutation_calls.fetch_add(1, Ordering::SeqCst);
        self.mutation_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(Ok(CollectionResponse {
                success: true,
                message: None,
            }))
    }
}
