//! Configuration type definitions.

use serde::Deserialize;

use crate::common::types::UserId;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub owner: OwnerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    pub filters: Option<FiltersConfig>,
}

/// Telegram Bot API connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Long-poll timeout passed to `getUpdates`, in seconds.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: default_api_url(),
            poll_timeout_secs: default_poll_timeout_secs(),
        }
    }
}

/// The immutable super-admin.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwnerConfig {
    #[serde(default)]
    pub id: UserId,
}

/// Where the persisted settings record lives.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_settings_path")]
    pub settings_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            settings_path: default_settings_path(),
        }
    }
}

/// Relay behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Upper bound for a single send to the destination, in seconds.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            send_timeout_secs: default_send_timeout_secs(),
        }
    }
}

/// Extra block patterns applied on top of the built-in link check.
#[derive(Debug, Clone, Deserialize)]
pub struct FiltersConfig {
    #[serde(default)]
    pub enabled: bool,
    pub patterns: Option<Vec<String>>,
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_settings_path() -> String {
    "settings.json".to_string()
}

fn default_send_timeout_secs() -> u64 {
    15
}

impl Config {
    /// Patterns of the extra filter, if enabled.
    pub fn block_patterns(&self) -> Option<Vec<String>> {
        self.filters
            .as_ref()
            .filter(|f| f.enabled)
            .and_then(|f| f.patterns.clone())
    }
}
