mod utils;

pub mod api;
pub mod auth;
pub mod background;
pub mod collection;
mod console;
pub mod db;
pub mod error;
pub mod lookup;
pub mod messages;
pub mod models;
pub mod session;
pub mod settings;
pub mod storage;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

pub use api::{HttpLexiconApi, LexiconApi};
pub use background::{Background, BackgroundHandle};
pub use db::Database;
pub use error::{ErrorKind, LookupError};
pub use lookup::{ResolverConfig, WordCache, WordResolver, EVICTION_INTERVAL};
pub use messages::{Message, Response};
pub use models::{CacheEntry, Credential, CurrentWordSlot, LexicalRecord, WordKey};
pub use session::WordEvent;
pub use settings::{ExtensionSettings, SettingsStore};
pub use storage::{KeyValueStore, Storage};

const DEFAULT_DATA_DIR: &str = ".lexicard";

pub fn run() -> anyhow::Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Lexicard starting up...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("lexicard")
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(serve())
}

async fn serve() -> anyhow::Result<()> {
    let data_dir = std::env::var("LEXICARD_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;

    let database = Database::new(data_dir.join("lexicard.sqlite3"))?;
    let storage = Storage::new(Arc::new(database));

    let defaults = ExtensionSettings::from_env();
    let settings = SettingsStore::new(storage.clone(), defaults.clone())
        .current()
        .await;
    log::info!("Using lexicon API at {}", settings.api_base_url);

    let api = Arc::new(HttpLexiconApi::new(
        &settings.api_base_url,
        api::REQUEST_TIMEOUT,
    ));
    let background = Background::new(storage, api, defaults, ResolverConfig::default());

    let cancel_token = CancellationToken::new();
    // The provider starts from the restored session so sync does not sign out.
    let restored = background.credentials().get_credential().await;
    let (auth_provider, auth_session) = watch::channel(restored);
    tokio::spawn(auth::sync_credentials(
        auth_session,
        background.credentials().clone(),
        cancel_token.clone(),
    ));

    let (handle, dispatcher) = background.spawn(EVICTION_INTERVAL, cancel_token.clone());
    let outcome = console::run_console(handle, auth_provider).await;

    cancel_token.cancel();
    dispatcher.await.context("background dispatcher panicked")?;
    log::info!("Lexicard stopped");

    outcome
}
