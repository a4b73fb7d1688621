use serde::{Deserialize, Serialize};
use std::fmt;

/// Response structure of a non-streamed chat completion.
///
/// Only the fields the bot reads are modelled; everything else the
/// backends attach (usage, provider, conversation ids) is ignored.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct ChatCompletion {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

/// A single generated choice.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: ResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// The assistant message inside a choice.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct ResponseMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<ChatContent>,
}

/// Content format that can be either a string or an array of content objects.
///
/// - String format: `"content": "Hello world"`
/// - Array format: `"content": [{"type": "text", "text": "Hello world"}]`
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum ChatContent {
    String(String),
    Array(Vec<ContentObject>),
}

/// Represents a single content object.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ContentObject {
    /// The type of content (typically "text")
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(default)]
    pub text: String,
}

impl fmt::Display for ChatContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatContent::String(s) => f.write_str(s),
            ChatContent::Array(parts) => parts
                .iter()
                .filter(|part| part.content_type == "text")
                .try_for_each(|part| f.write_str(&part.text)),
        }
    }
}

impl ChatCompletion {
    pub fn first_choice(&self) -> Option<&Choice> {
        self.choices.first()
    }

    /// Gets the content of the first choice as a string.
    pub fn first_content(&self) -> Option<String> {
        self.first_choice()
            .and_then(|choice| choice.message.content.as_ref())
            .map(ToString::to_string)
    }
}
