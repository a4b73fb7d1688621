use async_trait::async_trait;
use std::io::Write;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, InputFile, KeyboardButton, KeyboardMarkup, ParseMode};

use crate::error::BotError;

/// Telegram chat identifier.
pub type ChatRef = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Markdown,
    Plain,
}

/// Activity indicator shown to the user while a reply is prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Typing,
    UploadingPhoto,
}

/// Outbound side of the chat platform.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(
        &self,
        chat: ChatRef,
        text: &str,
        format: TextFormat,
    ) -> Result<(), BotError>;

    /// Sends `text` together with a one-row reply keyboard of `labels`.
    async fn send_keyboard(
        &self,
        chat: ChatRef,
        text: &str,
        labels: &[&str],
    ) -> Result<(), BotError>;

    /// Sends a JPEG photo with a caption.
    async fn send_photo(
        &self,
        chat: ChatRef,
        jpeg: Vec<u8>,
        caption: &str,
    ) -> Result<(), BotError>;

    async fn send_presence(&self, chat: ChatRef, presence: Presence) -> Result<(), BotError>;
}

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(
        &self,
        chat: ChatRef,
        text: &str,
        format: TextFormat,
    ) -> Result<(), BotError> {
        let request = self.bot.send_message(ChatId(chat), text);
        match format {
            // Legacy Markdown is what model replies are written in.
            #[allow(deprecated)]
            TextFormat::Markdown => request.parse_mode(ParseMode::Markdown).await?,
            TextFormat::Plain => request.await?,
        };
        Ok(())
    }

    async fn send_keyboard(
        &self,
        chat: ChatRef,
        text: &str,
        labels: &[&str],
    ) -> Result<(), BotError> {
        let row = labels.iter().map(|label| KeyboardButton::new(*label)).collect::<Vec<_>>();
        let keyboard = KeyboardMarkup::new(vec![row]).resize_keyboard();
        self.bot
            .send_message(ChatId(chat), text)
            .reply_markup(keyboard)
            .await?;
        Ok(())
    }

    async fn send_photo(
        &self,
        chat: ChatRef,
        jpeg: Vec<u8>,
        caption: &str,
    ) -> Result<(), BotError> {
        // Removed from disk when `file` drops, whether or not the upload worked.
        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile()?;
        file.write_all(&jpeg)?;
        file.flush()?;

        self.bot
            .send_photo(ChatId(chat), InputFile::file(file.path()))
            .caption(caption)
            .await?;
        Ok(())
    }

    async fn send_presence(&self, chat: ChatRef, presence: Presence) -> Result<(), BotError> {
        let action = match presence {
            Presence::Typing => ChatAction::Typing,
            Presence::UploadingPhoto => ChatAction::UploadPhoto,
        };
        self.bot.send_chat_action(ChatId(chat), action).await?;
        Ok(())
    }
}
