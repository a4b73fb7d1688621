pub mod client;
pub mod endpoints;
pub mod error;
pub mod raw_reply;
pub mod sse;

// Re-export commonly used types
pub use client::{FreeGptClient, FreeGptRequestBuilder, DEFAULT_BASE_URL};
pub use endpoints::chat::{
    ChatCompletion, ChatContent, ChatMessage, ChatRequest, ContentObject, Role, StreamChunk,
};
pub use endpoints::images::{GeneratedImage, ImageRequest, ImageResponse};
pub use endpoints::models::ModelList;
pub use error::{ErrorKind, FreeGptError};
pub use raw_reply::{ChunkStream, RawReply, EVENT_TEXT_MARKER};
