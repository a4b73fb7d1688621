use crate::config::{BotSettings, LoggingSettings, UpstreamSettings};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration file format for persistent settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ConfigFile {
    /// Chat front-end behaviour
    pub bot: BotSettings,
    /// Aggregation service location and credentials
    pub upstream: UpstreamSettings,
    /// Logger settings
    pub logging: LoggingSettings,
}

type ConfigResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Configuration manager for loading and saving configuration files
pub struct ConfigManager {
    config_path: String,
    config: ConfigFile,
}

impl ConfigManager {
    /// Creates a new configuration manager.
    ///
    /// A missing or unreadable file yields the defaults; call
    /// [`ConfigManager::load_config`] directly to see the error.
    pub fn new<P: AsRef<Path>>(config_path: P) -> Self {
        let config_path = config_path.as_ref().to_string_lossy().to_string();
        let config = match Self::load_config(&config_path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring configuration file {config_path}: {e}");
                ConfigFile::default()
            }
        };

        Self {
            config_path,
            config,
        }
    }

    /// Loads configuration from file, choosing the format by extension
    pub fn load_config(path: &str) -> ConfigResult<ConfigFile> {
        if !Path::new(path).exists() {
            return Ok(ConfigFile::default());
        }

        let content = fs::read_to_string(path)?;
        let config: ConfigFile = if path.ends_with(".json") {
            serde_json::from_str(&content)?
        } else if path.ends_with(".yaml") || path.ends_with(".yml") {
            serde_yaml::from_str(&content)?
        } else {
            // Default to TOML
            toml::from_str(&content)?
        };

        Ok(config)
    }

    /// Saves the current configuration back to its file
    pub fn save_config(&self) -> ConfigResult<()> {
        fs::write(&self.config_path, Self::render(&self.config_path, &self.config)?)?;
        Ok(())
    }

    /// Creates a default configuration file at the specified path
    pub fn create_default_config<P: AsRef<Path>>(path: P) -> ConfigResult<()> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        fs::write(path, Self::render(&path_str, &ConfigFile::default())?)?;
        Ok(())
    }

    fn render(path: &str, config: &ConfigFile) -> ConfigResult<String> {
        let content = if path.ends_with(".json") {
            serde_json::to_string_pretty(config)?
        } else if path.ends_with(".yaml") || path.ends_with(".yml") {
            serde_yaml::to_string(config)?
        } else {
            toml::to_string_pretty(config)?
        };
        Ok(content)
    }

    pub fn get_config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn get_config_mut(&mut self) -> &mut ConfigFile {
        &mut self.config
    }

    /// Validates the current configuration
    pub fn validate_config(&self) -> Result<(), Vec<String>> {
        let mut errors = self.config.bot.validate();
        errors.extend(self.config.upstream.validate());

        let level = self.config.logging.level.as_str();
        if !["trace", "debug", "info", "warn", "error"].contains(&level) {
            errors.push("Log level must be one of: trace, debug, info, warn, error".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Merges CLI arguments over the configuration file settings
    pub fn merge_with_cli_args(&mut self, cli_args: &crate::cli::Cli) {
        if let Some(base) = &cli_args.api_base {
            self.config.upstream.base_url = base.clone();
        }
        if let Some(key) = &cli_args.api_key {
            self.config.upstream.api_key = Some(key.clone());
        }
        if let Some(model) = &cli_args.text_model {
            self.config.bot.text_model = model.clone();
        }
        if let Some(model) = &cli_args.image_model {
            self.config.bot.image_model = model.clone();
        }
        if let Some(length) = cli_args.max_message_length {
            self.config.bot.max_message_length = length;
        }
        if let Some(level) = &cli_args.log_level {
            self.config.logging.level = level.clone();
        }
        if cli_args.log_to_file {
            self.config.logging.log_to_file = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let manager = ConfigManager::new(&path);
        assert_eq!(manager.get_config(), &ConfigFile::default());
    }

    #[test]
    fn test_round_trip_in_every_format() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["bot.toml", "bot.json", "bot.yaml"] {
            let path = dir.path().join(name);
            let mut manager = ConfigManager::new(&path);
            manager.get_config_mut().bot.text_model = "gpt-4o".to_string();
            manager.get_config_mut().upstream.api_key = Some("secret".to_string());
            manager.save_config().unwrap();

            let loaded = ConfigManager::load_config(path.to_str().unwrap()).unwrap();
            assert_eq!(loaded.bot.text_model, "gpt-4o", "{name}");
            assert_eq!(loaded.upstream.api_key.as_deref(), Some("secret"), "{name}");
        }
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        fs::write(&path, "[bot]\nimage_model = \"dall-e-3\"\n").unwrap();

        let manager = ConfigManager::new(&path);
        assert_eq!(manager.get_config().bot.image_model, "dall-e-3");
        assert_eq!(manager.get_config().bot.max_message_length, 4000);
        assert_eq!(manager.get_config().logging.level, "info");
    }

    #[test]
    fn test_create_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("default.yml");
        ConfigManager::create_default_config(&path).unwrap();
        let loaded = ConfigManager::load_config(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded, ConfigFile::default());
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut manager = ConfigManager::new("does-not-exist.toml");
        let cli = Cli {
            api_base: Some("https://g4f.example.org".to_string()),
            image_model: Some("sdxl".to_string()),
            max_message_length: Some(2000),
            log_level: Some("debug".to_string()),
            ..Cli::default()
        };
        manager.merge_with_cli_args(&cli);

        let config = manager.get_config();
        assert_eq!(config.upstream.base_url, "https://g4f.example.org");
        assert_eq!(config.bot.image_model, "sdxl");
        assert_eq!(config.bot.text_model, "gpt-4o-mini");
        assert_eq!(config.bot.max_message_length, 2000);
        assert_eq!(config.logging.level, "debug");
        assert!(manager.validate_config().is_ok());
    }

    #[test]
    fn test_validation_collects_errors() {
        let mut manager = ConfigManager::new("does-not-exist.toml");
        manager.get_config_mut().logging.level = "loud".to_string();
        manager.get_config_mut().upstream.base_url = "ftp://nowhere".to_string();

        let errors = manager.validate_config().unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
