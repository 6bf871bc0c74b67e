//! Configuration management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use web_notifications_protocol::DEFAULT_SERVER_ADDR;

/// HTTP/WebSocket server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,
}

fn default_listen() -> String {
    DEFAULT_SERVER_ADDR.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

/// Notification behaviour configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// How long registered callbacks are kept alive waiting for a terminal event, in seconds
    #[serde(default = "default_callback_ttl")]
    pub callback_ttl_secs: u64,
    /// Title of a notification shown to every newly connected session (empty = none)
    #[serde(default)]
    pub greeting: String,
}

fn default_callback_ttl() -> u64 {
    600
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            callback_ttl_secs: default_callback_ttl(),
            greeting: String::new(),
        }
    }
}

impl NotificationsConfig {
    pub fn callback_ttl(&self) -> Duration {
        Duration::from_secs(self.callback_ttl_secs)
    }
}

/// Bases the client uses to resolve application URL schemes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlConfig {
    /// Replaces `theme://`
    #[serde(default = "default_theme_base")]
    pub theme_base: String,
    /// Replaces `app://`
    #[serde(default)]
    pub app_base: String,
}

fn default_theme_base() -> String {
    "/themes/default".to_string()
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self {
            theme_base: default_theme_base(),
            app_base: String::new(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub urls: UrlConfig,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a file, falling back to defaults if it doesn't exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "webnotifications", "WebNotifications")
            .context("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Get the default configuration embedded in the binary
    pub fn default_config_str() -> &'static str {
        include_str!("../../config/default.toml")
    }
}
