//! Error taxonomy for word resolution, collection mutations and storage.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the lookup and session layers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The detected word was empty or malformed. Rejected before any I/O.
    #[error("invalid word '{0}'")]
    InvalidWord(String),

    /// Transport failure (connection refused, timeout, DNS, ...).
    #[error("network error: {0}")]
    Network(String),

    /// The remote service answered with a non-2xx status or an unusable body.
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// A mutation was attempted without a stored credential.
    #[error("sign-in required")]
    AuthRequired,

    /// A credential was missing one of token, user id or email.
    #[error("credential is incomplete")]
    InvalidCredential,

    /// Persistent store I/O failure. Only ever logged, never returned to
    /// business logic.
    #[error("storage error during {operation} of '{key}': {message}")]
    Storage {
        operation: &'static str,
        key: String,
        message: String,
    },
}

impl LookupError {
    pub fn storage(operation: &'static str, key: impl Into<String>, err: &anyhow::Error) -> Self {
        LookupError::Storage {
            operation,
            key: key.into(),
            message: format!("{err:#}"),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LookupError::InvalidWord(_) => ErrorKind::InvalidWord,
            LookupError::Network(_) => ErrorKind::Network,
            LookupError::Api { .. } => ErrorKind::Api,
            LookupError::AuthRequired => ErrorKind::AuthRequired,
            LookupError::InvalidCredential => ErrorKind::InvalidCredential,
            LookupError::Storage { .. } => ErrorKind::Storage,
        }
    }
}

/// Serializable discriminant of [`LookupError`], used when errors cross the
/// background message boundary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    InvalidWord,
    Network,
    Api,
    AuthRequired,
    InvalidCredential,
    Storage,
    Internal,
}

pub type Result<T> = std::result::Result<T, LookupError>;
