//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use claire_api::ApiConfig;
use claire_widget::{MessageTexts, WidgetConfig};

/// Configuration for claire
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base address of the assistant service
    pub base_url: Option<String>,
    /// Session identifier sent with every question
    pub session_id: Option<String>,
    /// Seconds between health probes
    pub health_interval_secs: Option<u64>,
    /// Seconds before a chat request is abandoned (unset waits forever)
    pub request_timeout_secs: Option<u64>,
    /// Overrides for the fixed message texts
    #[serde(default)]
    pub texts: TextOverrides,
}

/// Message text overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextOverrides {
    pub welcome: Option<String>,
    pub error: Option<String>,
    pub attachment_placeholder: Option<String>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("claire")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("CLAIRE_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse config from TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save config to file
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            base_url: Some(claire_api::client::DEFAULT_BASE_URL.to_string()),
            session_id: Some(claire_widget::widget::DEFAULT_SESSION_ID.to_string()),
            health_interval_secs: Some(60),
            request_timeout_secs: None,
            texts: TextOverrides::default(),
        };

        default_config.save()?;
        Ok(path)
    }

    /// Client settings, with defaults for anything unset
    pub fn api_config(&self) -> ApiConfig {
        let mut api = ApiConfig::default();
        if let Some(ref url) = self.base_url {
            api.base_url = url.clone();
        }
        api.request_timeout = self.request_timeout_secs.map(Duration::from_secs);
        api
    }

    /// Widget settings, with defaults for anything unset
    pub fn widget_config(&self) -> WidgetConfig {
        let mut widget = WidgetConfig::default();
        if let Some(ref id) = self.session_id {
            widget.session_id = id.clone();
        }
        if let Some(secs) = self.health_interval_secs {
            widget.health_interval = Duration::from_secs(secs);
        }

        let defaults = MessageTexts::default();
        widget.texts = MessageTexts {
            welcome: self.texts.welcome.clone().unwrap_or(defaults.welcome),
            error: self.texts.error.clone().unwrap_or(defaults.error),
            attachment_placeholder: self
                .texts
                .attachment_placeholder
                .clone()
                .unwrap_or(defaults.attachment_placeholder),
        };
        widget
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# claire configuration file
# Place at ~/.config/claire/config.toml (Linux/Mac) or %APPDATA%\claire\config.toml (Windows)

# Base address of the assistant service
base_url = "http://localhost:8000"

# Session identifier sent with every question
session_id = "bpi-user-123"

# Seconds between health probes
health_interval_secs = 60

# Seconds before a chat request is abandoned (omit to wait indefinitely)
# request_timeout_secs = 120

# Optional overrides for the fixed message texts
[texts]
# welcome = "Hello! How can I help?"
# error = "Something went wrong. Please try again."
# attachment_placeholder = "📎 File attachment"
"#
}
