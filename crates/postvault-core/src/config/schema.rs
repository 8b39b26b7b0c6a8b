//! Configuration schema definitions.

use crate::env::vars;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main Postvault configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Encryption key source and credential storage.
    #[serde(default)]
    pub secrets: SecretsConfig,

    /// Twitter/X API endpoints.
    #[serde(default)]
    pub twitter: TwitterConfig,

    /// Discord API endpoints.
    #[serde(default)]
    pub discord: DiscordConfig,

    /// Outbound HTTP settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the encryption key comes from and where records live.
///
/// The key itself is never stored here, only the name of the environment
/// variable that carries it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsConfig {
    /// Environment variable holding the 32-byte key.
    #[serde(default = "default_key_env")]
    pub key_env: String,

    /// Credential directory override (defaults to ~/.postvault/credentials).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_dir: Option<PathBuf>,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            key_env: default_key_env(),
            store_dir: None,
        }
    }
}

fn default_key_env() -> String {
    vars::POSTVAULT_ENCRYPTION_KEY.to_string()
}

/// Twitter/X endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitterConfig {
    /// Base URL for the v2 API (tweets).
    #[serde(default = "default_twitter_api_base")]
    pub api_base: String,

    /// Base URL for the v1.1 media upload API.
    #[serde(default = "default_twitter_upload_base")]
    pub upload_base: String,
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            api_base: default_twitter_api_base(),
            upload_base: default_twitter_upload_base(),
        }
    }
}

fn default_twitter_api_base() -> String {
    "https://api.twitter.com".to_string()
}

fn default_twitter_upload_base() -> String {
    "https://upload.twitter.com".to_string()
}

/// Discord endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Base URL for the REST API.
    #[serde(default = "default_discord_api_base")]
    pub api_base: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            api_base: default_discord_api_base(),
        }
    }
}

fn default_discord_api_base() -> String {
    "https://discord.com".to_string()
}

/// Outbound HTTP settings shared by all publishers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `POSTVAULT_LOG`/`RUST_LOG` are unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}
