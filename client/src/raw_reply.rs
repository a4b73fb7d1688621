//! Classification of whatever the chat endpoint sent back.
//!
//! The aggregation service proxies many unrelated backends and passes their
//! bodies through with little normalisation. [`RawReply`] names every shape
//! seen so far so that consumers can match on it instead of probing JSON.

use futures::{stream, stream::BoxStream, StreamExt};
use log::{debug, warn};
use reqwest::header::CONTENT_TYPE;
use serde_json::{Map, Value};
use std::fmt;

use crate::{
    endpoints::chat::{ChatCompletion, StreamChunk},
    error::FreeGptError,
    sse::decode_event_stream,
};

/// One-shot stream of reply fragments. Draining it consumes it.
pub type ChunkStream = BoxStream<'static, Result<StreamChunk, FreeGptError>>;

/// Marker that betrays an event stream flattened into a plain string.
pub const EVENT_TEXT_MARKER: &str = "data: {";

pub enum RawReply {
    /// A complete completion object exposing `choices[0].message.content`.
    SingleMessage(ChatCompletion),
    /// Fragments arriving one by one.
    ChunkSequence(ChunkStream),
    /// A bare JSON object with `content` or `message.content`.
    MappingPayload(Map<String, Value>),
    /// Event-stream lines delivered as one string.
    RawEventText(String),
    /// Anything else textual, taken verbatim.
    PlainString(String),
}

impl fmt::Debug for RawReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawReply::SingleMessage(c) => f.debug_tuple("SingleMessage").field(c).finish(),
            RawReply::ChunkSequence(_) => f.write_str("ChunkSequence(..)"),
            RawReply::MappingPayload(m) => f.debug_tuple("MappingPayload").field(m).finish(),
            RawReply::RawEventText(t) => f.debug_tuple("RawEventText").field(t).finish(),
            RawReply::PlainString(t) => f.debug_tuple("PlainString").field(t).finish(),
        }
    }
}

impl RawReply {
    /// Short name of the variant, for logs.
    pub fn shape(&self) -> &'static str {
        match self {
            RawReply::SingleMessage(_) => "single message",
            RawReply::ChunkSequence(_) => "chunk sequence",
            RawReply::MappingPayload(_) => "mapping payload",
            RawReply::RawEventText(_) => "raw event text",
            RawReply::PlainString(_) => "plain string",
        }
    }

    /// Wraps already-decoded fragments as a chunk sequence.
    pub fn from_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = StreamChunk>,
        I::IntoIter: Send + 'static,
    {
        RawReply::ChunkSequence(stream::iter(chunks.into_iter().map(Ok)).boxed())
    }

    /// Classifies a successful HTTP response.
    ///
    /// Event streams are decoded lazily; every other body is read completely
    /// and handed to [`RawReply::classify_body`].
    pub async fn from_response(response: reqwest::Response) -> Result<Self, FreeGptError> {
        let is_event_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/event-stream"));

        if is_event_stream {
            debug!("Upstream replied with an event stream");
            return Ok(RawReply::ChunkSequence(decode_event_stream(
                response.bytes_stream(),
            )));
        }

        let body = response.text().await?;
        Ok(Self::classify_body(&body))
    }

    /// Classifies a fully read, non-streamed body.
    pub fn classify_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => Self::classify_object(map),
            Ok(Value::Array(items)) => Self::from_chunks(decode_items(items)),
            Ok(Value::String(text)) => Self::classify_text(text),
            Ok(other) => RawReply::PlainString(other.to_string()),
            Err(_) => Self::classify_text(body.to_string()),
        }
    }

    /// Classifies a body that is known to be plain text.
    pub fn classify_text(text: String) -> Self {
        if text.contains(EVENT_TEXT_MARKER) {
            RawReply::RawEventText(text)
        } else {
            RawReply::PlainString(text)
        }
    }

    fn classify_object(map: Map<String, Value>) -> Self {
        let first_choice = map
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first());

        match first_choice {
            Some(choice) if choice.get("message").is_some() => {
                match serde_json::from_value::<ChatCompletion>(Value::Object(map.clone())) {
                    Ok(completion) => RawReply::SingleMessage(completion),
                    Err(e) => {
                        warn!("Completion object did not match the expected schema: {e}");
                        RawReply::MappingPayload(map)
                    }
                }
            }
            Some(choice) if choice.get("delta").is_some() => {
                Self::from_chunks(decode_items(vec![Value::Object(map)]))
            }
            _ => RawReply::MappingPayload(map),
        }
    }
}

fn decode_items(items: Vec<Value>) -> Vec<StreamChunk> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<StreamChunk>(item) {
            Ok(chunk) => Some(chunk),
            Err(e) => {
                warn!("Skipping undecodable chunk: {e}");
                None
            }
        })
        .collect()
}
