use serde::{Deserialize, Serialize};

use super::ChatContent;

/// One fragment of a streamed reply.
///
/// Backends disagree on the fragment shape: OpenAI-style backends send
/// `{"choices":[{"delta":{"content":"..."}}]}`, some repeat the whole
/// `message` object per chunk, a few send `{"content":"..."}` and the odd one
/// sends bare JSON strings. All of them deserialize into this type.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum StreamChunk {
    Text(String),
    Fragment(ChunkBody),
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct ChunkBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<ChunkChoice>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ChatContent>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct ChunkChoice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<ChunkContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<ChunkContent>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct ChunkContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ChatContent>,
}

impl StreamChunk {
    /// Builds a chunk carrying `content` in an OpenAI-style delta.
    pub fn delta<S: Into<String>>(content: S) -> Self {
        StreamChunk::Fragment(ChunkBody {
            choices: Some(vec![ChunkChoice {
                delta: Some(ChunkContent {
                    content: Some(ChatContent::String(content.into())),
                }),
                message: None,
            }]),
            content: None,
        })
    }

    /// Text carried by this fragment, if any.
    ///
    /// Looks at `choices[0].delta.content`, then `choices[0].message.content`,
    /// then a top-level `content` field.
    pub fn content(&self) -> Option<String> {
        match self {
            StreamChunk::Text(text) => Some(text.clone()),
            StreamChunk::Fragment(body) => body
                .choices
                .as_ref()
                .and_then(|choices| choices.first())
                .and_then(|choice| {
                    choice
                        .delta
                        .as_ref()
                        .and_then(|d| d.content.as_ref())
                        .or_else(|| choice.message.as_ref().and_then(|m| m.content.as_ref()))
                })
                .or(body.content.as_ref())
                .map(ToString::to_string),
        }
    }
}
