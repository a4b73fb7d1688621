use serde::{Deserialize, Serialize};
use std::fmt;

/// The author of a conversation turn.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        f.write_str(name)
    }
}

/// A single conversation turn as sent to the chat endpoint.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A request for the `/v1/chat/completions` endpoint.
///
/// # Fields
/// * `model` - Model identifier understood by the aggregation service
/// * `messages` - Ordered conversation, oldest first
/// * `stream` - Ask for a server-sent-event body instead of a single JSON object
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub stream: bool,
}

impl ChatRequest {
    /// Creates a new ChatRequest builder.
    pub fn builder() -> super::ChatRequestBuilder {
        super::ChatRequestBuilder::default()
    }
}
