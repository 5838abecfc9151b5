//! Messages exchanged between the detection/display contexts and the
//! background context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    collection::AddOutcome,
    error::{ErrorKind, LookupError},
    models::CurrentWordSlot,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Fire-and-forget: resolution runs in the background.
    WordDetected {
        word: String,
        url: String,
        #[serde(with = "chrono::serde::ts_milliseconds")]
        timestamp: DateTime<Utc>,
    },
    GetCurrentWordData,
    AddFlashcard {
        #[serde(rename = "flashcardId")]
        flashcard_id: String,
    },
    SetAuthData {
        token: String,
        #[serde(rename = "userId")]
        user_id: String,
        email: String,
    },
    GetAuthData,
    ClearAuthData,
}

impl Message {
    pub fn word_detected(word: impl Into<String>, url: impl Into<String>) -> Self {
        Message::WordDetected {
            word: word.into(),
            url: url.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Response {
    Ack,
    CurrentWordData {
        slot: Option<CurrentWordSlot>,
    },
    AddFlashcardResult {
        success: bool,
        message: Option<String>,
    },
    AuthData {
        #[serde(rename = "authToken")]
        auth_token: Option<String>,
        #[serde(rename = "userId")]
        user_id: Option<String>,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
}

impl From<LookupError> for Response {
    fn from(err: LookupError) -> Self {
        Response::Error {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<AddOutcome> for Response {
    fn from(outcome: AddOutcome) -> Self {
        Response::AddFlashcardResult {
            success: outcome.success,
            message: outcome.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn messages_use_screaming_type_tags() {
        let message: Message = serde_json::from_value(json!({
            "type": "ADD_FLASHCARD",
            "flashcardId": "fc-1"
        }))
        .unwrap();
        assert_eq!(
            message,
            Message::AddFlashcard {
                flashcard_id: "fc-1".into()
            }
        );

        let encoded = serde_json::to_value(Message::GetCurrentWordData).unwrap();
        assert_eq!(encoded, json!({"type": "GET_CURRENT_WORD_DATA"}));
    }

    #[test]
    fn word_detected_carries_millisecond_timestamp() {
        let message: Message = serde_json::from_value(json!({
            "type": "WORD_DETECTED",
            "word": "Serendipity",
            "url": "https://dictionary.example/serendipity",
            "timestamp": 1_700_000_000_123_i64
        }))
        .unwrap();

        match message {
            Message::WordDetected { timestamp, .. } => {
                assert_eq!(timestamp.timestamp_millis(), 1_700_000_000_123)
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_message_type_is_rejected() {
        let result = serde_json::from_value::<Message>(json!({"type": "DELETE_EVERYTHING"}));
        assert!(result.is_err());
    }

    #[test]
    fn errors_cross_the_boundary_as_data() {
        let response = Response::from(LookupError::AuthRequired);
        assert_eq!(
            serde_json::to_value(response).unwrap(),
            json!({"type": "ERROR", "kind": "authRequired", "message": "sign-in required"})
        );
    }
}
