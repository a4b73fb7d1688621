use super::request_types::{ChatMessage, ChatRequest};

/// Builder for constructing ChatRequest instances.
#[derive(Debug, Clone, Default)]
pub struct ChatRequestBuilder {
    model: Option<String>,
    messages: Vec<ChatMessage>,
    stream: bool,
}

impl ChatRequestBuilder {
    /// Sets the model for the chat request.
    pub fn model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Adds a message to the chat request.
    pub fn message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// Adds multiple messages to the chat request, keeping their order.
    pub fn messages<I>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = ChatMessage>,
    {
        self.messages.extend(messages);
        self
    }

    /// Requests a streamed (server-sent-event) reply.
    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Builds the ChatRequest.
    ///
    /// # Panics
    /// Panics if model is not set
    pub fn build(self) -> ChatRequest {
        ChatRequest {
            model: self.model.expect("Model must be set"),
            messages: self.messages,
            stream: self.stream,
        }
    }
}
