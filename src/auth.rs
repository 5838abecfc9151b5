//! Mirrors the auth provider's session into the credential cache.
//!
//! The provider itself is opaque: it publishes the current credential (or
//! `None` when signed out) on a `watch` channel, which covers both a
//! `getToken()` read and an `onChange` subscription.

use log::info;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{models::Credential, session::CredentialCache};

pub async fn sync_credentials(
    mut provider: watch::Receiver<Option<Credential>>,
    credentials: CredentialCache,
    cancel_token: CancellationToken,
) {
    loop {
        let session = provider.borrow_and_update().clone();
        apply(&credentials, session).await;

        tokio::select! {
            changed = provider.changed() => {
                if changed.is_err() {
                    info!("Auth provider closed; stopping credential sync");
                    break;
                }
            }
            _ = cancel_token.cancelled() => break,
        }
    }
}

async fn apply(credentials: &CredentialCache, session: Option<Credential>) {
    match session {
        Some(credential) => {
            // Incomplete sessions are rejected and logged by the cache.
            let _ = credentials.set_credential(&credential).await;
        }
        None => credentials.clear_credential().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;

    #[tokio::test]
    async fn restores_then_follows_sign_out() {
        let credentials = CredentialCache::new(Storage::in_memory());
        let credential = Credential::new("tok", "user-1", "reader@example.com");
        let (tx, rx) = watch::channel(Some(credential.clone()));
        let token = CancellationToken::new();

        let task = tokio::spawn(sync_credentials(rx, credentials.clone(), token.clone()));

        while credentials.get_credential().await.is_none() {
            tokio::task::yield_now().await;
        }
        assert_eq!(credentials.get_credential().await, Some(credential));

        tx.send(None).unwrap();
        while credentials.get_credential().await.is_some() {
            tokio::task::yield_now().await;
        }

        drop(tx);
        task.await.unwrap();
    }
}
