//! Lexical data models.
//!
//! `LexicalRecord` mirrors the body of `GET /word/{word}`. Records are
//! immutable once decoded and are replaced wholesale on re-fetch.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LookupError, Result};

const MAX_WORD_CHARS: usize = 100;

/// Normalized identity of a looked-up word: trimmed and lowercased.
///
/// Two keys are equal iff their normalized forms are equal, so
/// `WordKey::parse("  Example ")` and `WordKey::parse("example")` address the
/// same cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WordKey(String);

impl WordKey {
    pub fn normalize(raw: &str) -> String {
        raw.trim().to_lowercase()
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = Self::normalize(raw);
        if normalized.is_empty()
            || normalized.chars().count() > MAX_WORD_CHARS
            || normalized.chars().any(char::is_control)
        {
            return Err(LookupError::InvalidWord(raw.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for WordKey {
    type Error = LookupError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<WordKey> for String {
    fn from(key: WordKey) -> Self {
        key.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PartOfSpeech {
    Noun,
    Pronoun,
    Verb,
    Adjective,
    Adverb,
    Preposition,
    Conjunction,
    Interjection,
    Article,
    Determiner,
    AuxiliaryVerb,
    Idiom,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WordInfo {
    pub id: String,
    pub text: String,
    pub core_meaning: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Meaning {
    pub id: String,
    pub part_of_speech: PartOfSpeech,
    pub translation: String,
    pub pronunciation: String,
    pub example_source: String,
    pub example_translated: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: String,
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LexicalRecord {
    pub flashcard_id: String,
    pub word: WordInfo,
    /// Ordered by primacy; never empty in a valid record.
    pub meanings: Vec<Meaning>,
    pub media: Media,
}

impl LexicalRecord {
    /// Checks the invariants serde cannot express.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.flashcard_id.trim().is_empty() {
            return Err("record has no flashcardId".into());
        }
        if self.meanings.is_empty() {
            return Err(format!("record for '{}' has no meanings", self.word.text));
        }
        Ok(())
    }
}
