//! Credential types.
//!
//! Records hold only tokens and plaintext routing metadata; plaintext
//! secrets exist only inside [`PlatformCredentials`] and [`DecryptedSecret`],
//! both of which redact themselves when formatted.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use postvault_core::SecretString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SecretError;

/// Secret field names for Twitter records.
pub mod twitter_fields {
    pub const CONSUMER_KEY: &str = "consumer_key";
    pub const CONSUMER_SECRET: &str = "consumer_secret";
    pub const ACCESS_TOKEN: &str = "access_token";
    pub const ACCESS_TOKEN_SECRET: &str = "access_token_secret";
}

/// Secret field names for Discord records.
pub mod discord_fields {
    pub const BOT_TOKEN: &str = "bot_token";
}

/// Metadata key for a record's default Discord channel.
pub const DISCORD_CHANNEL_ID: &str = "channel_id";

/// A plaintext secret freshly produced by decryption.
///
/// Debug and Display both emit `[REDACTED]` to prevent accidental logging.
pub struct DecryptedSecret {
    inner: SecretString,
}

impl DecryptedSecret {
    /// Create a new decrypted secret from raw plaintext.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: SecretString::new(value),
        }
    }

    /// Expose the plaintext value. Use sparingly.
    pub fn expose(&self) -> &str {
        self.inner.expose_secret()
    }

    /// Hand the plaintext on without copying it into a bare `String`.
    pub fn into_secret_string(self) -> SecretString {
        self.inner
    }
}

impl From<SecretString> for DecryptedSecret {
    fn from(inner: SecretString) -> Self {
        Self { inner }
    }
}

impl fmt::Debug for DecryptedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for DecryptedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Supported publishing platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    Discord,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Twitter => "twitter",
            Self::Discord => "discord",
        }
    }

    /// Secret fields every record of this platform must carry.
    pub fn secret_fields(self) -> &'static [&'static str] {
        match self {
            Self::Twitter => &[
                twitter_fields::CONSUMER_KEY,
                twitter_fields::CONSUMER_SECRET,
                twitter_fields::ACCESS_TOKEN,
                twitter_fields::ACCESS_TOKEN_SECRET,
            ],
            Self::Discord => &[discord_fields::BOT_TOKEN],
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = SecretError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "twitter" | "x" => Ok(Self::Twitter),
            "discord" => Ok(Self::Discord),
            other => Err(SecretError::InvalidCredential(format!(
                "unknown platform '{other}'"
            ))),
        }
    }
}

/// OAuth 1.0a user-context credentials for Twitter/X.
#[derive(Debug, Clone)]
pub struct TwitterCredentials {
    pub consumer_key: SecretString,
    pub consumer_secret: SecretString,
    pub access_token: SecretString,
    pub access_token_secret: SecretString,
}

/// Discord bot credentials.
#[derive(Debug, Clone)]
pub struct DiscordCredentials {
    pub bot_token: SecretString,
}

/// Decrypted credentials for one platform account.
#[derive(Debug, Clone)]
pub enum PlatformCredentials {
    Twitter(TwitterCredentials),
    Discord(DiscordCredentials),
}

impl PlatformCredentials {
    pub fn platform(&self) -> Platform {
        match self {
            Self::Twitter(_) => Platform::Twitter,
            Self::Discord(_) => Platform::Discord,
        }
    }

    /// Secret fields as `(name, plaintext)` pairs, in a fixed order.
    pub fn fields(&self) -> Vec<(&'static str, &SecretString)> {
        match self {
            Self::Twitter(c) => vec![
                (twitter_fields::CONSUMER_KEY, &c.consumer_key),
                (twitter_fields::CONSUMER_SECRET, &c.consumer_secret),
                (twitter_fields::ACCESS_TOKEN, &c.access_token),
                (twitter_fields::ACCESS_TOKEN_SECRET, &c.access_token_secret),
            ],
            Self::Discord(c) => vec![(discord_fields::BOT_TOKEN, &c.bot_token)],
        }
    }

    /// Rebuild credentials from decrypted fields.
    pub fn from_fields(
        platform: Platform,
        mut fields: BTreeMap<String, SecretString>,
    ) -> Result<Self, SecretError> {
        let mut take = |name: &str| {
            fields.remove(name).ok_or_else(|| {
                SecretError::InvalidCredential(format!("{platform} record is missing '{name}'"))
            })
        };

        Ok(match platform {
            Platform::Twitter => Self::Twitter(TwitterCredentials {
                consumer_key: take(twitter_fields::CONSUMER_KEY)?,
                consumer_secret: take(twitter_fields::CONSUMER_SECRET)?,
                access_token: take(twitter_fields::ACCESS_TOKEN)?,
                access_token_secret: take(twitter_fields::ACCESS_TOKEN_SECRET)?,
            }),
            Platform::Discord => Self::Discord(DiscordCredentials {
                bot_token: take(discord_fields::BOT_TOKEN)?,
            }),
        })
    }
}

/// An account's credentials as persisted: tokens only, never plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub id: String,
    pub owner_id: String,
    pub platform: Platform,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Secret field name to encrypted token.
    pub secrets: BTreeMap<String, String>,

    /// Plaintext, non-secret routing data (e.g. a Discord channel id).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// Start a new record with a random id and no secrets yet.
    pub fn new(owner_id: impl Into<String>, platform: Platform) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            platform,
            label: None,
            secrets: BTreeMap::new(),
            metadata: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn summary(&self) -> CredentialSummary {
        CredentialSummary {
            id: self.id.clone(),
            owner_id: self.owner_id.clone(),
            platform: self.platform,
            label: self.label.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Metadata about a stored credential -- no plaintext or ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSummary {
    pub id: String,
    pub owner_id: String,
    pub platform: Platform,
    pub label: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
