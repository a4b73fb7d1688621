pub mod chunker;
pub mod cli;
pub mod config;
pub mod config_manager;
pub mod error;
pub mod imaging;
pub mod messenger;
pub mod normalizer;
pub mod provider;
pub mod relay;
pub mod session;
pub mod telegram;

pub use error::BotError;
pub use messenger::{Messenger, TelegramMessenger};
pub use provider::{ChatBackend, FreeGptProvider};
pub use relay::Relay;
