use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::chunker::{DEFAULT_MAX_LENGTH, MAX_CHUNK_LENGTH};

/// Behaviour of the chat front-end.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BotSettings {
    /// Longest chunk handed to Telegram, at most [`MAX_CHUNK_LENGTH`] so the
    /// "[Part i/N]" label still fits under the hard 4096 limit.
    pub max_message_length: usize,
    /// Model used for text replies
    pub text_model: String,
    /// Model used for image generation
    pub image_model: String,
    pub image_width: u32,
    pub image_height: u32,
    /// Timeout for downloading a generated image, in seconds
    pub image_fetch_timeout_seconds: u64,
    /// Shown by /models when the service cannot list its models
    pub fallback_models: Vec<String>,
}

/// Where the aggregation service lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UpstreamSettings {
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Write logs to a file in the working directory instead of stderr
    pub log_to_file: bool,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            max_message_length: DEFAULT_MAX_LENGTH,
            text_model: "gpt-4o-mini".to_string(),
            image_model: "flux".to_string(),
            image_width: 1024,
            image_height: 1024,
            image_fetch_timeout_seconds: 60,
            fallback_models: ["gpt-3.5-turbo", "gpt-4", "gpt-4o", "gpt-4o-mini"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: freegpt_client::DEFAULT_BASE_URL.to_string(),
            api_key: None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: false,
        }
    }
}

impl BotSettings {
    pub fn image_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.image_fetch_timeout_seconds)
    }

    /// Returns every problem found, empty when the settings are usable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.max_message_length == 0 || self.max_message_length > MAX_CHUNK_LENGTH {
            errors.push(format!(
                "max_message_length must be between 1 and {MAX_CHUNK_LENGTH}, got {}",
                self.max_message_length
            ));
        }
        if self.text_model.trim().is_empty() {
            errors.push("text_model must not be empty".to_string());
        }
        if self.image_model.trim().is_empty() {
            errors.push("image_model must not be empty".to_string());
        }
        if self.image_width == 0 || self.image_height == 0 {
            errors.push("image dimensions must be positive".to_string());
        }
        if self.image_fetch_timeout_seconds == 0 {
            errors.push("image_fetch_timeout_seconds must be positive".to_string());
        }
        errors
    }
}

impl UpstreamSettings {
    pub fn validate(&self) -> Vec<String> {
        if self.base_url.starts_with("http://") || self.base_url.starts_with("https://") {
            Vec::new()
        } else {
            vec![format!(
                "upstream base_url must start with http:// or https://, got '{}'",
                self.base_url
            )]
        }
    }
}
