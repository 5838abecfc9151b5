//! Line-oriented stand-in for the display surface and the auth provider.

use anyhow::{Context, Result};
use log::warn;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::{broadcast::error::RecvError, watch},
};

use crate::{
    background::BackgroundHandle,
    messages::{Message, Response},
    models::{Credential, CurrentWordSlot},
    session::WordEvent,
};

const HELP: &str = "commands: lookup <word> | show | save | retry | login <token> <user-id> <email> | logout | whoami | quit";
const CONSOLE_URL: &str = "console://input";

pub async fn run_console(
    background: BackgroundHandle,
    auth_provider: watch::Sender<Option<Credential>>,
) -> Result<()> {
    let watcher = tokio::spawn(watch_events(background.clone()));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_word: Option<String> = None;

    println!("{HELP}");
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            continue;
        };
        let rest: Vec<&str> = parts.collect();

        match command {
            "lookup" if !rest.is_empty() => {
                let word = rest.join(" ");
                background
                    .notify(Message::word_detected(word.clone(), CONSOLE_URL))
                    .await?;
                last_word = Some(word);
            }
            "retry" => match &last_word {
                Some(word) => {
                    background
                        .notify(Message::word_detected(word.clone(), CONSOLE_URL))
                        .await?
                }
                None => println!("nothing to retry"),
            },
            "show" => match background.send(Message::GetCurrentWordData).await? {
                Response::CurrentWordData { slot: Some(slot) } => println!("{}", render(&slot)),
                _ => println!("no word yet"),
            },
            "save" => save_current(&background).await?,
            "login" if rest.len() == 3 => {
                auth_provider.send_replace(Some(Credential::new(rest[0], rest[1], rest[2])));
                println!("signed in as {}", rest[2]);
            }
            "logout" => {
                auth_provider.send_replace(None);
                println!("signed out");
            }
            "whoami" => match background.send(Message::GetAuthData).await? {
                Response::AuthData {
                    user_id: Some(user_id),
                    ..
                } => println!("user {user_id}"),
                _ => println!("not signed in"),
            },
            "quit" | "exit" => break,
            _ => println!("{HELP}"),
        }
    }

    watcher.abort();
    Ok(())
}

async fn save_current(background: &BackgroundHandle) -> Result<()> {
    let Response::CurrentWordData { slot: Some(slot) } =
        background.send(Message::GetCurrentWordData).await?
    else {
        println!("look a word up first");
        return Ok(());
    };

    let response = background
        .send(Message::AddFlashcard {
            flashcard_id: slot.data.record.flashcard_id.clone(),
        })
        .await?;
    match response {
        Response::AddFlashcardResult { success: true, .. } => {
            println!("saved '{}' to your collection", slot.word)
        }
        Response::AddFlashcardResult { message, .. } => println!(
            "could not save '{}': {}",
            slot.word,
            message.unwrap_or_else(|| "unknown error".into())
        ),
        Response::Error { message, .. } => println!("{message}; use `login` first"),
        other => warn!("unexpected response to ADD_FLASHCARD: {other:?}"),
    }
    Ok(())
}

/// Prints a card whenever the slot changes. Events are only hints, so the
/// slot itself is always re-read.
async fn watch_events(background: BackgroundHandle) {
    let mut events = background.subscribe();
    loop {
        match events.recv().await {
            Ok(WordEvent::Updated { .. }) | Err(RecvError::Lagged(_)) => {
                if let Ok(Response::CurrentWordData { slot: Some(slot) }) =
                    background.send(Message::GetCurrentWordData).await
                {
                    println!("{}", render(&slot));
                }
            }
            Ok(WordEvent::LookupFailed { word, message, .. }) => {
                println!("lookup failed for '{word}' ({message}); type `retry` to try again")
            }
            Ok(WordEvent::Cleared) => println!("no word selected"),
            Err(RecvError::Closed) => break,
        }
    }
}

fn render(slot: &CurrentWordSlot) -> String {
    let record = &slot.data.record;
    let mut card = format!(
        "== {} ==\n{}\n{}",
        record.word.text, record.word.core_meaning, record.word.explanation
    );
    for meaning in &record.meanings {
        card.push_str(&format!(
            "\n- [{:?}] {} {}\n    {}\n    {}",
            meaning.part_of_speech,
            meaning.translation,
            meaning.pronunciation,
            meaning.example_source,
            meaning.example_translated
        ));
    }
    card
}
