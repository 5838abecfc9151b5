use std::collections::HashMap;

use log::{debug, info, warn};
use serde_json::Value;

use crate::{
    error::{LookupError, Result},
    models::Credential,
    storage::{keys, Storage},
};

const CREDENTIAL_KEYS: [&str; 3] = [keys::AUTH_TOKEN, keys::USER_ID, keys::USER_EMAIL];

/// Token and identity of the signed-in user, persisted as three keys.
///
/// The three keys are written with one `set_many`, but a backend need not
/// apply that atomically, so reads are all-or-nothing: a torn state (for
/// example a reader racing a sign-out) is reported as signed out.
#[derive(Clone)]
pub struct CredentialCache {
    storage: Storage,
}

impl CredentialCache {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub async fn set_credential(&self, credential: &Credential) -> Result<()> {
        if !credential.is_complete() {
            warn!("Refusing to store incomplete credential");
            return Err(LookupError::InvalidCredential);
        }

        let entries = HashMap::from([
            (keys::AUTH_TOKEN.to_string(), Value::from(credential.token.as_str())),
            (keys::USER_ID.to_string(), Value::from(credential.user_id.as_str())),
            (keys::USER_EMAIL.to_string(), Value::from(credential.email.as_str())),
        ]);
        self.storage.set_many(entries).await;
        info!("Stored credential for user {}", credential.user_id);
        Ok(())
    }

    pub async fn get_credential(&self) -> Option<Credential> {
        let values = self.storage.get_many(&CREDENTIAL_KEYS).await;
        let field = |key: &str| {
            values
                .get(key)
                .and_then(Value::as_str)
                .filter(|value| !value.trim().is_empty())
                .map(str::to_string)
        };

        match (
            field(keys::AUTH_TOKEN),
            field(keys::USER_ID),
            field(keys::USER_EMAIL),
        ) {
            (Some(token), Some(user_id), Some(email)) => Some(Credential {
                token,
                user_id,
                email,
            }),
            (None, None, None) => None,
            _ => {
                debug!("Credential keys are partially populated; treating as signed out");
                None
            }
        }
    }

    pub async fn clear_credential(&self) {
        self.storage.remove(&CREDENTIAL_KEYS).await;
        info!("Cleared stored credential");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn credential() -> Credential {
        Credential::new("tok-1", "user-1", "reader@example.com")
    }

    #[tokio::test]
    async fn set_then_get_returns_equal_credential() {
        let cache = CredentialCache::new(Storage::in_memory());
        cache.set_credential(&credential()).await.unwrap();

        assert_eq!(cache.get_credential().await, Some(credential()));
    }

    #[tokio::test]
    async fn clear_removes_all_fields() {
        let cache = CredentialCache::new(Storage::in_memory());
        cache.set_credential(&credential()).await.unwrap();
        cache.clear_credential().await;

        assert_eq!(cache.get_credential().await, None);
    }

    #[tokio::test]
    async fn torn_state_reads_as_absent() {
        let storage = Storage::in_memory();
        let cache = CredentialCache::new(storage.clone());
        cache.set_credential(&credential()).await.unwrap();

        // Simulate a crash between the per-key deletes of a sign-out.
        storage.remove(&[keys::USER_ID]).await;
        assert_eq!(cache.get_credential().await, None);

        storage.set(keys::USER_ID, &json!("")).await;
        assert_eq!(cache.get_credential().await, None);
    }

    #[tokio::test]
    async fn incomplete_credential_is_not_written() {
        let storage = Storage::in_memory();
        let cache = CredentialCache::new(storage.clone());

        let result = cache
            .set_credential(&Credential::new("tok", "user", " "))
            .await;

        assert_eq!(result, Err(LookupError::InvalidCredential));
        assert!(storage.get_many(&CREDENTIAL_KEYS).await.is_empty());
    }
}
