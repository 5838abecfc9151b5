//! Remote lexicon service: word lookups and the "add to collection" mutation.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    models::{Credential, LexicalRecord, WordKey},
};

pub use http::{HttpLexiconApi, REQUEST_TIMEOUT};

/// Body of `PUT /user/add/usingFlashcard`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFlashcardRequest {
    pub user_id: String,
    pub flashcard_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Transport to the lexicon service.
///
/// A single call is a single attempt: implementations must not retry.
/// Transport failures map to [`crate::error::LookupError::Network`], non-2xx
/// answers and undecodable bodies to [`crate::error::LookupError::Api`].
#[async_trait]
pub trait LexiconApi: Send + Sync {
    async fn fetch_word(&self, word: &WordKey) -> Result<LexicalRecord>;

    async fn add_to_collection(
        &self,
        credential: &Credential,
        flashcard_id: &str,
    ) -> Result<CollectionResponse>;
}

#[cfg(test)]
pub(crate) mod fake;
