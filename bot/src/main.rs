use clap::Parser;
use flexi_logger::{FileSpec, Logger, WriteMode};
use freegpt_bot::{
    cli::Cli, config_manager::ConfigManager, provider::ChatBackend, telegram, BotError,
    FreeGptProvider, Relay, TelegramMessenger,
};
use log::{info, warn};
use std::sync::Arc;
use teloxide::Bot;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Handle config file creation
    if cli.create_config {
        if let Err(e) = ConfigManager::create_default_config(&cli.config) {
            return Err(anyhow::anyhow!("Failed to create config file: {}", e));
        }
        println!("Created default configuration file: {}", cli.config);
        return Ok(());
    }

    // Load and merge configuration
    let mut config_manager = ConfigManager::new(&cli.config);
    config_manager.merge_with_cli_args(&cli);

    if let Err(errors) = config_manager.validate_config() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        return Err(BotError::Config(errors.join("; ")).into());
    }
    let config = config_manager.get_config().clone();

    let mut logger =
        Logger::try_with_str(&config.logging.level)?.write_mode(WriteMode::BufferAndFlush);
    logger = if config.logging.log_to_file {
        logger.log_to_file(FileSpec::default())
    } else {
        logger.log_to_stderr()
    };
    let _logger = logger.start()?;

    let provider = FreeGptProvider::new(&config.upstream.base_url, config.upstream.api_key.clone());

    if cli.list_models {
        for model in provider.list_models().await? {
            println!("{model}");
        }
        return Ok(());
    }

    let token = match cli.telegram_token {
        Some(token) => token,
        None => {
            warn!("Telegram bot token not set, exiting");
            return Ok(());
        }
    };

    info!("Starting Telegram bot...");
    info!("Upstream service: {}", config.upstream.base_url);
    info!("Configuration Summary:");
    info!("  - Text model: {}", config.bot.text_model);
    info!("  - Image model: {}", config.bot.image_model);
    info!("  - Max message length: {}", config.bot.max_message_length);

    let bot = Bot::new(token);
    let relay = Relay::connect(
        Arc::new(provider),
        Arc::new(TelegramMessenger::new(bot.clone())),
        config.bot,
    )
    .await;

    telegram::run(bot, Arc::new(relay)).await;
    Ok(())
}
