pub mod credentials;
pub mod current_word;

pub use credentials::CredentialCache;
pub use current_word::{CurrentWordStore, WordEvent};
