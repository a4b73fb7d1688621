//! Turns any [`RawReply`] into a single display string.

use freegpt_client::{ChatMessage, FreeGptError, RawReply, StreamChunk, EVENT_TEXT_MARKER};
use futures::TryStreamExt;
use log::{debug, error, info};
use serde_json::{Map, Value};

/// Shown when a reply parsed cleanly but carried no text.
pub const FALLBACK_REPLY: &str = "Failed to obtain a reply from the model.";

/// Prefix of the text shown to the user when the upstream call failed.
pub const ERROR_MARKER: &str = "An error occurred: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub text: String,
    /// The text was stitched together from stream fragments.
    pub streamed: bool,
}

/// Extracts the reply text from whatever shape the service returned.
///
/// A chunk sequence is drained here; a transport error while draining aborts
/// the whole reply. Never yields an empty string.
pub async fn normalize(reply: RawReply) -> Result<Normalized, FreeGptError> {
    debug!("Normalizing reply of shape: {}", reply.shape());

    let (mut text, mut streamed) = match reply {
        RawReply::SingleMessage(completion) => {
            (completion.first_content().unwrap_or_default(), false)
        }
        RawReply::ChunkSequence(chunks) => {
            let text = chunks
                .try_fold(String::new(), |mut acc, chunk| async move {
                    if let Some(content) = chunk.content() {
                        acc.push_str(&content);
                    }
                    Ok(acc)
                })
                .await?;
            (text, true)
        }
        RawReply::MappingPayload(map) => (mapping_content(&map), true),
        RawReply::RawEventText(raw) => (parse_event_text(&raw), true),
        RawReply::PlainString(text) => (text, false),
    };

    // Some backends wrap a whole event stream inside an otherwise normal reply.
    if text.contains(EVENT_TEXT_MARKER) {
        let reparsed = parse_event_text(&text);
        if !reparsed.is_empty() {
            text = reparsed;
            streamed = true;
        }
    }

    if text.is_empty() {
        text = FALLBACK_REPLY.to_string();
    }

    Ok(Normalized { text, streamed })
}

/// Concatenates the content of every `data: {...}` line in `raw`.
///
/// Lines that fail to decode are logged and skipped.
pub fn parse_event_text(raw: &str) -> String {
    let mut text = String::new();
    for line in raw.lines() {
        let line = line.trim_start();
        if !line.starts_with(EVENT_TEXT_MARKER) {
            continue;
        }
        let payload = &line["data: ".len()..];
        match serde_json::from_str::<StreamChunk>(payload) {
            Ok(chunk) => {
                if let Some(content) = chunk.content() {
                    text.push_str(&content);
                }
            }
            Err(e) => error!("Skipping undecodable event line: {e}"),
        }
    }
    text
}

fn mapping_content(map: &Map<String, Value>) -> String {
    map.get("content")
        .and_then(Value::as_str)
        .or_else(|| {
            map.get("message")
                .and_then(|message| message.get("content"))
                .and_then(Value::as_str)
        })
        .unwrap_or_default()
        .to_string()
}

/// Converts the outcome of a completion into what the user sees and the
/// assistant turn to remember. Failures are shown but never remembered.
pub fn display(result: Result<Normalized, FreeGptError>) -> (String, Option<ChatMessage>) {
    match result {
        Ok(normalized) => {
            if normalized.streamed {
                info!(
                    "Reconstructed streamed reply ({} chars)",
                    normalized.text.chars().count()
                );
            }
            let turn = ChatMessage::assistant(normalized.text.clone());
            (normalized.text, Some(turn))
        }
        Err(e) => (format!("{ERROR_MARKER}{e}"), None),
    }
}
