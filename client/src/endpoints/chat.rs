pub mod chat_builder;
pub mod request_types;
pub mod response_types;
pub mod stream_chunk;

pub use chat_builder::*;
pub use request_types::*;
pub use response_types::*;
pub use stream_chunk::*;

use crate::client::{FreeGptClient, FreeGptRequestBuilder, PayloadPending};

impl FreeGptClient {
    /// Creates a request builder for the chat completion endpoint
    pub fn chat(self) -> FreeGptRequestBuilder<PayloadPending, ChatRequest> {
        let url = self.url("/v1/chat/completions");
        self.client.post(&url).into()
    }
}
