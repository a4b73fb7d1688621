use freegpt_client::FreeGptError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Upstream API error: {0}")]
    Upstream(#[from] FreeGptError),
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BotError {
    /// Short tag used in log lines.
    pub fn error_code(&self) -> &'static str {
        match self {
            BotError::Upstream(_) => "upstream_error",
            BotError::Telegram(_) => "telegram_error",
            BotError::Io(_) => "io_error",
            BotError::Image(_) => "image_error",
            BotError::Config(_) => "config_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_error_wraps_client_error() {
        let err = BotError::from(FreeGptError::UnsupportedModel("gpt-9".to_string()));
        assert_eq!(err.error_code(), "upstream_error");
        assert_eq!(err.to_string(), "Upstream API error: unsupported model: gpt-9");
    }

    #[test]
    fn test_config_error_message() {
        let err = BotError::Config("missing token".to_string());
        assert_eq!(err.error_code(), "config_error");
        assert_eq!(err.to_string(), "Configuration error: missing token");
    }
}
