pub mod session;
pub mod word;

pub use session::{CacheEntry, Credential, CurrentWordSlot};
pub use word::{LexicalRecord, Meaning, Media, PartOfSpeech, WordInfo, WordKey};
