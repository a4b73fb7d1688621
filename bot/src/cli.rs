use clap::Parser;

#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "freegpt-bot",
    about = "A Telegram bot that relays chats and image prompts to a free-tier LLM aggregation service",
    version
)]
pub struct Cli {
    /// Telegram bot token (alternatively use TELEGRAM_BOT_TOKEN env var)
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub telegram_token: Option<String>,

    /// Base URL of the aggregation service
    #[arg(long, env = "FREEGPT_API_BASE")]
    pub api_base: Option<String>,

    /// API key for the aggregation service, if it requires one
    #[arg(long, env = "FREEGPT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model used for text replies
    #[arg(long)]
    pub text_model: Option<String>,

    /// Model used for image generation
    #[arg(long)]
    pub image_model: Option<String>,

    /// Longest message chunk sent to Telegram
    #[arg(long)]
    pub max_message_length: Option<usize>,

    /// Path to the configuration file (TOML, JSON or YAML)
    #[arg(long, default_value = "freegpt-bot.toml")]
    pub config: String,

    /// Write a default configuration file to --config and exit
    #[arg(long)]
    pub create_config: bool,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Write logs to a file instead of stderr
    #[arg(long)]
    pub log_to_file: bool,

    /// List the models offered by the aggregation service and exit
    #[arg(long)]
    pub list_models: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_overrides() {
        let cli = Cli::try_parse_from([
            "freegpt-bot",
            "--text-model",
            "gpt-4o",
            "--max-message-length",
            "3000",
            "--config",
            "bot.yaml",
            "--list-models",
        ])
        .unwrap();

        assert_eq!(cli.text_model.as_deref(), Some("gpt-4o"));
        assert_eq!(cli.max_message_length, Some(3000));
        assert_eq!(cli.config, "bot.yaml");
        assert!(cli.list_models);
        assert!(!cli.create_config);
    }

    #[test]
    fn test_default_config_path() {
        let cli = Cli::try_parse_from(["freegpt-bot"]).unwrap();
        assert_eq!(cli.config, "freegpt-bot.toml");
        assert!(cli.image_model.is_none());
    }
}
