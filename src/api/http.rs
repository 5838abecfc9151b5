use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use ureq::Agent;

use super::{AddFlashcardRequest, CollectionResponse, LexiconApi};
use crate::{
    error::{LookupError, Result},
    models::{Credential, LexicalRecord, WordKey},
};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocking `ureq` client driven from tokio's blocking pool.
#[derive(Clone)]
pub struct HttpLexiconApi {
    agent: Agent,
    base_url: String,
}

impl HttpLexiconApi {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();

        Self {
            agent: config.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn word_url(&self, word: &WordKey) -> String {
        format!("{}/word/{}", self.base_url, encode_path_segment(word.as_str()))
    }

    pub fn collection_url(&self) -> String {
        format!("{}/user/add/usingFlashcard", self.base_url)
    }
}

#[async_trait]
impl LexiconApi for HttpLexiconApi {
    async fn fetch_word(&self, word: &WordKey) -> Result<LexicalRecord> {
        let agent = self.agent.clone();
        let url = self.word_url(word);
        debug!("GET {url}");

        let record = tokio::task::spawn_blocking(move || -> Result<LexicalRecord> {
            let mut resp = agent
                .get(url.as_str())
                .header("Accept", "application/json")
                .call()
                .map_err(classify)?;
            let status = resp.status().as_u16();

            resp.body_mut()
                .read_json::<LexicalRecord>()
                .map_err(|err| LookupError::Api {
                    status,
                    message: format!("malformed lexical record: {err}"),
                })
        })
        .await
        .map_err(|err| LookupError::Network(format!("fetch worker join failed: {err}")))??;

        record
            .validate()
            .map_err(|message| LookupError::Api {
                status: 200,
                message,
            })?;
        Ok(record)
    }

    async fn add_to_collection(
        &self,
        credential: &Credential,
        flashcard_id: &str,
    ) -> Result<CollectionResponse> {
        let agent = self.agent.clone();
        let url = self.collection_url();
        let authorization = format!("Bearer {}", credential.token);
        let body = AddFlashcardRequest {
            user_id: credential.user_id.clone(),
            flashcard_id: flashcard_id.to_string(),
        };
        debug!("PUT {url}");

        tokio::task::spawn_blocking(move || -> Result<CollectionResponse> {
            let mut resp = agent
                .put(url.as_str())
                .header("Authorization", authorization)
                .send_json(&body)
                .map_err(classify)?;
            let status = resp.status().as_u16();

            resp.body_mut()
                .read_json::<CollectionResponse>()
                .map_err(|err| LookupError::Api {
                    status,
                    message: format!("malformed collection response: {err}"),
                })
        })
        .await
        .map_err(|err| LookupError::Network(format!("mutation worker join failed: {err}")))?
    }
}

fn classify(err: ureq::Error) -> LookupError {
    match err {
        ureq::Error::StatusCode(status) => LookupError::Api {
            status,
            message: format!("unexpected status {status}"),
        },
        other => LookupError::Network(other.to_string()),
    }
}

/// Percent-encodes everything outside the RFC 3986 unreserved set.
fn encode_path_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}
