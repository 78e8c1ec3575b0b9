//! Client settings

use crate::error::{ConfigError, Result};
use crate::find_config_file;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const API_URL_ENV: &str = "INFRADOC_API_URL";

const SUPPORTED_LANGUAGES: [&str; 2] = ["pt", "en"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the inventory service
    pub api_url: String,
    pub poll_interval_secs: u64,
    pub tick_interval_secs: u64,
    pub request_timeout_secs: u64,
    /// Document language used when no preference is stored
    pub language: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            poll_interval_secs: 2,
            tick_interval_secs: 1,
            request_timeout_secs: 60,
            language: "pt".to_string(),
        }
    }
}

impl Settings {
    /// Discover and load the settings file, then apply environment overrides.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let settings = match find_config_file() {
            Ok(path) => Self::load_from(&path)?,
            Err(ConfigError::ConfigFileNotFound) => {
                tracing::debug!("No settings file found, using defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };
        settings.with_env_overrides().validated()
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        tracing::debug!("Loading settings from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(api_url) = std::env::var(API_URL_ENV) {
            if !api_url.trim().is_empty() {
                self.api_url = api_url;
            }
        }
        self
    }

    /// Reject values the client cannot run with
    pub fn validated(self) -> Result<Self> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(ConfigError::InvalidSetting {
                field: "api_url",
                message: format!("expected an http(s) URL, got '{}'", self.api_url),
            });
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "poll_interval_secs",
                message: "must be at least 1".to_string(),
            });
        }
        if self.tick_interval_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "tick_interval_secs",
                message: "must be at least 1".to_string(),
            });
        }
        if !SUPPORTED_LANGUAGES.contains(&self.language.as_str()) {
            return Err(ConfigError::InvalidSetting {
                field: "language",
                message: format!("unsupported language '{}'", self.language),
            });
        }
        Ok(self)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
