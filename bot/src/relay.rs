//! Command and keyboard handling, independent of the chat platform SDK.

use freegpt_client::{ChatMessage, FreeGptError};
use log::{debug, info, warn};
use std::sync::Arc;

use crate::chunker::{label_parts, split_message};
use crate::config::BotSettings;
use crate::error::BotError;
use crate::imaging::generate_jpeg;
use crate::messenger::{ChatRef, Messenger, Presence, TextFormat};
use crate::normalizer::{display, normalize, Normalized};
use crate::provider::ChatBackend;
use crate::session::{Mode, SessionStore, UserId};

pub const TEXT_MODE_BUTTON: &str = "🤖 GPT";
pub const IMAGE_MODE_BUTTON: &str = "🎨 Image";

pub const TEXT_MODE_ENABLED: &str =
    "Switched to text generation. Every message you send will now go to GPT.";
pub const IMAGE_MODE_ENABLED: &str =
    "Switched to image generation. Every message you send will now be drawn as a picture.";
pub const GPT_USAGE: &str = "Please add a message after the /gpt command";
pub const IMAGE_USAGE: &str = "Please add an image description after the /image command";
pub const HISTORY_CLEARED: &str = "Message history cleared.";
pub const IMAGE_FAILED: &str = "Failed to generate an image. Try another prompt.";
pub const OPERATION_CANCELLED: &str = "Operation cancelled.";

/// Routes user input to the upstream service and sends the answers back.
pub struct Relay {
    sessions: SessionStore,
    backend: Arc<dyn ChatBackend>,
    messenger: Arc<dyn Messenger>,
    settings: BotSettings,
    models: Vec<String>,
}

impl Relay {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        messenger: Arc<dyn Messenger>,
        settings: BotSettings,
        models: Vec<String>,
    ) -> Self {
        Self {
            sessions: SessionStore::new(),
            backend,
            messenger,
            settings,
            models,
        }
    }

    /// Builds a relay, asking the service for its model list once.
    ///
    /// Falls back to the configured list when the service cannot answer.
    pub async fn connect(
        backend: Arc<dyn ChatBackend>,
        messenger: Arc<dyn Messenger>,
        settings: BotSettings,
    ) -> Self {
        let models = match backend.list_models().await {
            Ok(models) if !models.is_empty() => models,
            Ok(_) => {
                warn!("Service listed no models, using the fallback list");
                settings.fallback_models.clone()
            }
            Err(e) => {
                warn!("Could not list models, using the fallback list: {e}");
                settings.fallback_models.clone()
            }
        };
        info!("{} models available", models.len());
        Self::new(backend, messenger, settings, models)
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// `/start`: fresh session, greeting and mode keyboard.
    pub async fn start(
        &self,
        chat: ChatRef,
        user: UserId,
        first_name: &str,
    ) -> Result<(), BotError> {
        self.sessions.reset(user).await;
        debug!("Session reset for user {user}, {} sessions open", self.sessions.len().await);
        let greeting = format!(
            "Hello, {first_name}! I am a bot powered by GPT. Send me a message and I will \
             answer using free models.\n\n\
             Current settings:\n\
             - Text replies: {}\n\
             - Image generation: {}\n\n\
             Press \"{TEXT_MODE_BUTTON}\" to generate text or \"{IMAGE_MODE_BUTTON}\" to generate pictures.\n\
             Current mode: text generation",
            self.settings.text_model, self.settings.image_model,
        );
        self.messenger
            .send_keyboard(chat, &greeting, &[TEXT_MODE_BUTTON, IMAGE_MODE_BUTTON])
            .await
    }

    /// Plain text: mode buttons switch the mode, anything else is a prompt
    /// answered in the current mode.
    pub async fn handle_text(
        &self,
        chat: ChatRef,
        user: UserId,
        text: &str,
    ) -> Result<(), BotError> {
        match text {
            TEXT_MODE_BUTTON => {
                self.sessions.set_mode(user, Mode::Text).await;
                self.messenger.send_text(chat, TEXT_MODE_ENABLED, TextFormat::Plain).await
            }
            IMAGE_MODE_BUTTON => {
                self.sessions.set_mode(user, Mode::Image).await;
                self.messenger.send_text(chat, IMAGE_MODE_ENABLED, TextFormat::Plain).await
            }
            prompt => match self.sessions.mode(user).await {
                Mode::Text => self.answer_text(chat, user, prompt).await,
                Mode::Image => self.answer_image(chat, prompt).await,
            },
        }
    }

    /// `/gpt <prompt>`: text answer whatever the current mode.
    pub async fn gpt_command(
        &self,
        chat: ChatRef,
        user: UserId,
        args: &str,
    ) -> Result<(), BotError> {
        let prompt = normalize_args(args);
        if prompt.is_empty() {
            return self.messenger.send_text(chat, GPT_USAGE, TextFormat::Plain).await;
        }
        self.answer_text(chat, user, &prompt).await
    }

    /// `/image <prompt>`: picture whatever the current mode.
    pub async fn image_command(&self, chat: ChatRef, args: &str) -> Result<(), BotError> {
        let prompt = normalize_args(args);
        if prompt.is_empty() {
            return self.messenger.send_text(chat, IMAGE_USAGE, TextFormat::Plain).await;
        }
        self.answer_image(chat, &prompt).await
    }

    pub async fn clear(&self, chat: ChatRef, user: UserId) -> Result<(), BotError> {
        self.sessions.clear(user).await;
        self.messenger.send_text(chat, HISTORY_CLEARED, TextFormat::Plain).await
    }

    pub async fn list_models(&self, chat: ChatRef) -> Result<(), BotError> {
        let text = format!("Available models:\n{}", self.models.join("\n"));
        self.messenger.send_text(chat, &text, TextFormat::Plain).await
    }

    /// Asks for a completion, retrying once as a stream when the plain
    /// attempt fails in a way a stream might not. Draining the reply counts as
    /// part of the attempt.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<Normalized, FreeGptError> {
        match self.attempt(messages, false).await {
            Err(e) if e.is_retryable() => {
                warn!("Completion failed ({:?}: {e}), retrying as a stream", e.kind());
                let mut normalized = self.attempt(messages, true).await?;
                normalized.streamed = true;
                Ok(normalized)
            }
            result => result,
        }
    }

    async fn attempt(
        &self,
        messages: &[ChatMessage],
        stream: bool,
    ) -> Result<Normalized, FreeGptError> {
        let reply = self
            .backend
            .complete(&self.settings.text_model, messages, stream)
            .await?;
        normalize(reply).await
    }

    async fn answer_text(&self, chat: ChatRef, user: UserId, prompt: &str) -> Result<(), BotError> {
        self.show_presence(chat, Presence::Typing).await;

        let user_turn = ChatMessage::user(prompt);
        let mut messages = self.sessions.history(user).await;
        messages.push(user_turn.clone());
        debug!("Sending {} messages for user {user}", messages.len());

        let result = self.complete(&messages).await;
        if let Err(e) = &result {
            warn!("Completion failed for user {user}: {e}");
        }
        let (text, assistant_turn) = display(result);
        self.sessions.record_exchange(user, user_turn, assistant_turn).await;

        self.send_chunked(chat, &text).await
    }

    async fn answer_image(&self, chat: ChatRef, prompt: &str) -> Result<(), BotError> {
        self.show_presence(chat, Presence::UploadingPhoto).await;

        match generate_jpeg(self.backend.as_ref(), &self.settings, prompt).await {
            Some(jpeg) => {
                let caption = format!("Generated for prompt: {prompt}");
                self.messenger.send_photo(chat, jpeg, &caption).await
            }
            None => self.messenger.send_text(chat, IMAGE_FAILED, TextFormat::Plain).await,
        }
    }

    async fn send_chunked(&self, chat: ChatRef, text: &str) -> Result<(), BotError> {
        let max_length = self.settings.max_message_length;
        for part in label_parts(split_message(text, max_length), max_length) {
            self.send_formatted(chat, &part).await?;
        }
        Ok(())
    }

    /// Markdown first; model output often is not valid Markdown, so a
    /// rejected part is sent once more as plain text.
    async fn send_formatted(&self, chat: ChatRef, text: &str) -> Result<(), BotError> {
        if let Err(e) = self.messenger.send_text(chat, text, TextFormat::Markdown).await {
            warn!("Markdown send failed, retrying as plain text: {e}");
            self.messenger.send_text(chat, text, TextFormat::Plain).await?;
        }
        Ok(())
    }

    async fn show_presence(&self, chat: ChatRef, presence: Presence) {
        if let Err(e) = self.messenger.send_presence(chat, presence).await {
            debug!("Could not show {presence:?}: {e}");
        }
    }
}

/// Collapses any run of whitespace in command arguments into one space.
pub fn normalize_args(args: &str) -> String {
    args.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_args() {
        assert_eq!(normalize_args("  a   red\n fox "), "a red fox");
        assert_eq!(normalize_args("   "), "");
    }
}
