//! Authenticated "add to collection" mutation.

use std::sync::Arc;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    api::LexiconApi,
    error::{LookupError, Result},
    session::CredentialCache,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddOutcome {
    pub success: bool,
    pub message: Option<String>,
}

/// Saves flashcards to the signed-in user's collection.
///
/// Mutations are attempted exactly once. No idempotency key is sent, so
/// calling this twice for the same flashcard may add it twice server-side.
#[derive(Clone)]
pub struct CollectionGateway {
    api: Arc<dyn LexiconApi>,
    credentials: CredentialCache,
}

impl CollectionGateway {
    pub fn new(api: Arc<dyn LexiconApi>, credentials: CredentialCache) -> Self {
        Self { api, credentials }
    }

    pub async fn add_to_collection(&self, flashcard_id: &str) -> Result<AddOutcome> {
        let credential = self
            .credentials
            .get_credential()
            .await
            .ok_or(LookupError::AuthRequired)?;

        match self.api.add_to_collection(&credential, flashcard_id).await {
            Ok(response) => {
                info!(
                    "Add of flashcard {flashcard_id} for user {} returned success={}",
                    credential.user_id, response.success
                );
                Ok(AddOutcome {
                    success: response.success,
                    message: response.message,
                })
            }
            Err(err) => {
                warn!("Add of flashcard {flashcard_id} failed: {err}");
                Ok(AddOutcome {
                    success: false,
                    message: Some(err.to_string()),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::{fake::FakeApi, CollectionResponse},
        models::Credential,
        storage::Storage,
    };

    async fn signed_in(api: Arc<FakeApi>) -> CollectionGateway {
        let credentials = CredentialCache::new(Storage::in_memory());
        credentials
            .set_credential(&Credential::new("tok", "user-1", "reader@example.com"))
            .await
            .unwrap();
        CollectionGateway::new(api, credentials)
    }

    #[tokio::test]
    async fn missing_credential_fails_without_network() {
        let api = FakeApi::succeeding();
        let gateway = CollectionGateway::new(
            api.clone(),
            CredentialCache::new(Storage::in_memory()),
        );

        let result = gateway.add_to_collection("fc-1").await;

        assert_eq!(result, Err(LookupError::AuthRequired));
        assert_eq!(api.mutation_calls(), 0);
    }

    #[tokio::test]
    async fn success_is_passed_through() {
        let api = FakeApi::succeeding();
        let gateway = signed_in(api.clone()).await;

        let outcome = gateway.add_to_collection("fc-1").await.unwrap();

        assert!(outcome.success);
        assert_eq!(api.mutation_calls(), 1);
    }

    #[tokio::test]
    async fn server_error_is_not_retried() {
        let api = FakeApi::succeeding().with_mutation_result(Err(LookupError::Api {
            status: 500,
            message: "unexpected status 500".into(),
        }));
        let gateway = signed_in(api.clone()).await;

        let outcome = gateway.add_to_collection("fc-1").await.unwrap();

        assert!(!outcome.success);
        assert_eq!(api.mutation_calls(), 1);
    }

    #[tokio::test]
    async fn server_reported_failure_is_surfaced() {
        let api = FakeApi::succeeding().with_mutation_result(Ok(CollectionResponse {
            success: false,
            message: Some("already saved".into()),
        }));
        let gateway = signed_in(api).await;

        let outcome = gateway.add_to_collection("fc-1").await.unwrap();

        assert_eq!(
            outcome,
            AddOutcome {
                success: false,
                message: Some("already saved".into())
            }
        );
    }
}
