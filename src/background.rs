//! The background context: owns the caches, the resolver and the gateway,
//! and serves [`Message`]s from the detection and display contexts.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    task::JoinHandle,
    time::Duration,
};
use tokio_util::sync::CancellationToken;

use crate::{
    api::LexiconApi,
    collection::CollectionGateway,
    lookup::{eviction_loop, ResolverConfig, WordCache, WordResolver},
    messages::{Message, Response},
    models::{Credential, WordKey},
    session::{CredentialCache, CurrentWordStore, WordEvent},
    settings::{ExtensionSettings, SettingsStore},
    storage::Storage,
};

const MAILBOX_CAPACITY: usize = 64;

struct Envelope {
    message: Message,
    reply: Option<oneshot::Sender<Response>>,
}

#[derive(Clone)]
pub struct Background {
    resolver: WordResolver,
    gateway: CollectionGateway,
    cache: WordCache,
    credentials: CredentialCache,
    current: CurrentWordStore,
    settings: SettingsStore,
}

impl Background {
    pub fn new(
        storage: Storage,
        api: Arc<dyn LexiconApi>,
        defaults: ExtensionSettings,
        config: ResolverConfig,
    ) -> Self {
        let cache = WordCache::new(storage.clone());
        let current = CurrentWordStore::new(storage.clone());
        let credentials = CredentialCache::new(storage.clone());
        let resolver = WordResolver::new(api.clone(), cache.clone(), current.clone(), config);

        Self {
            resolver,
            gateway: CollectionGateway::new(api, credentials.clone()),
            cache,
            credentials,
            current,
            settings: SettingsStore::new(storage, defaults),
        }
    }

    pub fn resolver(&self) -> &WordResolver {
        &self.resolver
    }

    pub fn credentials(&self) -> &CredentialCache {
        &self.credentials
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub async fn handle(&self, message: Message) -> Response {
        match message {
            Message::WordDetected { word, url, .. } => {
                if !self.settings.current().await.auto_detect {
                    debug!("Auto-detect disabled; ignoring '{word}' from {url}");
                    return Response::Ack;
                }
                let key = match WordKey::parse(&word) {
                    Ok(key) => key,
                    Err(err) => {
                        warn!("Rejected detected word from {url}: {err}");
                        return err.into();
                    }
                };
                info!("Word detected: '{key}' on {url}");
                // Detached: the display learns the outcome from the slot.
                drop(self.resolver.spawn_resolve(key));
                Response::Ack
            }
            Message::GetCurrentWordData => Response::CurrentWordData {
                slot: self.current.get_current().await,
            },
            Message::AddFlashcard { flashcard_id } => {
                match self.gateway.add_to_collection(&flashcard_id).await {
                    Ok(outcome) => outcome.into(),
                    Err(err) => err.into(),
                }
            }
            Message::SetAuthData {
                token,
                user_id,
                email,
            } => {
                let credential = Credential {
                    token,
                    user_id,
                    email,
                };
                match self.credentials.set_credential(&credential).await {
                    Ok(()) => Response::Ack,
                    Err(err) => err.into(),
                }
            }
            Message::GetAuthData => {
                let credential = self.credentials.get_credential().await;
                Response::AuthData {
                    auth_token: credential.as_ref().map(|c| c.token.clone()),
                    user_id: credential.map(|c| c.user_id),
                }
            }
            Message::ClearAuthData => {
                self.credentials.clear_credential().await;
                Response::Ack
            }
        }
    }

    pub fn spawn(
        self,
        eviction_interval: Duration,
        cancel_token: CancellationToken,
    ) -> (BackgroundHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(MAILBOX_CAPACITY);
        let handle = BackgroundHandle {
            sender,
            current: self.current.clone(),
        };

        tokio::spawn(eviction_loop(
            self.cache.clone(),
            eviction_interval,
            cancel_token.clone(),
        ));
        let dispatcher = tokio::spawn(dispatch_loop(self, receiver, cancel_token));

        (handle, dispatcher)
    }
}

async fn dispatch_loop(
    background: Background,
    mut receiver: mpsc::Receiver<Envelope>,
    cancel_token: CancellationToken,
) {
    loop {
        tokio::select! {
            envelope = receiver.recv() => {
                let Some(Envelope { message, reply }) = envelope else {
                    break;
                };
                let background = background.clone();
                tokio::spawn(async move {
                    let response = background.handle(message).await;
                    if let Some(reply) = reply {
                        if reply.send(response).is_err() {
                            debug!("Sender went away before the response was ready");
                        }
                    }
                });
            }
            _ = cancel_token.cancelled() => break,
        }
    }

    info!("Background dispatcher shutting down");
}

#[derive(Clone)]
pub struct BackgroundHandle {
    sender: mpsc::Sender<Envelope>,
    current: CurrentWordStore,
}

impl BackgroundHandle {
    pub async fn send(&self, message: Message) -> Result<Response> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(Envelope {
                message,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| anyhow!("background context is not running"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("background context dropped the request"))
    }

    pub async fn notify(&self, message: Message) -> Result<()> {
        self.sender
            .send(Envelope {
                message,
                reply: None,
            })
            .await
            .map_err(|_| anyhow!("background context is not running"))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WordEvent> {
        self.current.subscribe()
    }
}
