// Configuration management for Labi Chat CLI
//
// Cross-platform config stored in:
// - macOS: ~/Library/Application Support/labichat/config.json
// - Linux: ~/.config/labichat/config.json
// - Windows: %APPDATA%\labichat\config.json

use anyhow::{Context, Result};
use labichat_core::blob::DEFAULT_GATEWAY;
use labichat_core::store::DEFAULT_SLOT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory of the chat database (auto if unset)
    pub storage_path: Option<String>,

    /// Slot the room collection is stored under
    pub storage_key: String,

    /// Default tracing filter when RUST_LOG is unset
    pub log_level: String,

    /// Gateway prefix used by `labichat link`
    pub gateway_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_path: None,
            storage_key: DEFAULT_SLOT.to_string(),
            log_level: "warn".to_string(),
            gateway_url: DEFAULT_GATEWAY.to_string(),
        }
    }
}

impl Config {
    /// Get the config directory path (cross-platform)
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join("labichat");

        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;

        Ok(config_dir)
    }

    /// Get the data directory path (cross-platform)
    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .context("Failed to determine data directory")?
            .join("labichat");

        std::fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

        Ok(data_dir)
    }

    /// Load config from the default location, creating it on first use
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_dir()?.join("config.json"))
    }

    pub fn load_from(config_file: &Path) -> Result<Self> {
        if config_file.exists() {
            let contents =
                std::fs::read_to_string(config_file).context("Failed to read config file")?;
            let config: Config =
                serde_json::from_str(&contents).context("Failed to parse config file")?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(config_file)?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_dir()?.join("config.json"))
    }

    pub fn save_to(&self, config_file: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_file, contents).context("Failed to write config file")?;
        Ok(())
    }

    /// Where the chat database lives
    pub fn chat_db_path(&self) -> Result<PathBuf> {
        match self.storage_path {
            Some(ref path) => Ok(PathBuf::from(path)),
            None => Ok(Self::data_dir()?.join("chats")),
        }
    }

    /// Set a config value (does not save)
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "storage_path" => {
                self.storage_path = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            "storage_key" => {
                if value.is_empty() {
                    anyhow::bail!("storage_key cannot be empty");
                }
                self.storage_key = value.to_string();
            }
            "log_level" => {
                tracing_subscriber::EnvFilter::try_new(value)
                    .context("Invalid log filter")?;
                self.log_level = value.to_string();
            }
            "gateway_url" => {
                if !value.starts_with("http://") && !value.starts_with("https://") {
                    anyhow::bail!("gateway_url must be an http(s) URL");
                }
                self.gateway_url = value.to_string();
            }
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        Ok(())
    }

    /// Get a config value
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "storage_path" => self.storage_path.clone(),
            "storage_key" => Some(self.storage_key.clone()),
            "log_level" => Some(self.log_level.clone()),
            "gateway_url" => Some(self.gateway_url.clone()),
            _ => None,
        }
    }

    /// List all config values
    pub fn list(&self) -> Vec<(String, String)> {
        vec![
            (
                "storage_path".to_string(),
                self.storage_path
                    .clone()
                    .unwrap_or_else(|| "(auto)".to_string()),
            ),
            ("storage_key".to_string(), self.storage_key.clone()),
            ("log_level".to_string(), self.log_level.clone()),
            ("gateway_url".to_string(), self.gateway_url.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.storage_key, "labi-chat-messages");
        assert_eq!(config.log_level, "warn");
        assert!(config.storage_path.is_none());
    }

    #[test]
    fn test_set_and_get() {
        let mut config = Config::default();
        config.set("storage_key", "alt-slot").unwrap();
        config.set("log_level", "labichat_core=debug").unwrap();
        config.set("storage_path", "/tmp/chats").unwrap();

        assert_eq!(config.get("storage_key").as_deref(), Some("alt-slot"));
        assert_eq!(config.get("log_level").as_deref(), Some("labichat_core=debug"));
        assert_eq!(config.chat_db_path().unwrap(), PathBuf::from("/tmp/chats"));

        config.set("storage_path", "").unwrap();
        assert!(config.get("storage_path").is_none());
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.set("storage_key", "").is_err());
        assert!(config.set("gateway_url", "ftp://x").is_err());
        assert!(config.set("listen_port", "9000").is_err());
    }

    #[test]
    fn test_load_creates_default_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("config.json");

        let config = Config::load_from(&file)?;
        assert!(file.exists());
        assert_eq!(config.storage_key, DEFAULT_SLOT);

        let mut changed = config;
        changed.set("storage_key", "other")?;
        changed.save_to(&file)?;
        assert_eq!(Config::load_from(&file)?.storage_key, "other");
        Ok(())
    }

    #[test]
    fn test_partial_config_fills_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("config.json");
        std::fs::write(&file, r#"{"log_level":"info"}"#)?;

        let config = Config::load_from(&file)?;
        assert_eq!(config.log_level, "info");
        assert_eq!(config.storage_key, DEFAULT_SLOT);
        Ok(())
    }
}
