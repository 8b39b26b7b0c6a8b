//! Discord publisher using the bot REST API.
//!
//! Posts to one channel with `POST /api/v10/channels/{id}/messages`. No
//! gateway connection is opened; sending a message only needs the bot token.

use std::time::Duration;

use async_trait::async_trait;
use postvault_core::SecretString;
use postvault_secrets::{DiscordCredentials, Platform};
use reqwest::{multipart, Client};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::check_response;
use crate::traits::{Post, PublishReceipt, Publisher};
use crate::{ChannelError, Result};

/// Default Discord API base URL.
const DEFAULT_API_BASE: &str = "https://discord.com";

/// Maximum message length in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Maximum attachments per message.
pub const MAX_ATTACHMENTS: usize = 10;

/// Publishes messages to a single Discord channel.
pub struct DiscordPublisher {
    client: Client,
    bot_token: SecretString,
    channel_id: String,
    api_base: String,
}

impl std::fmt::Debug for DiscordPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordPublisher")
            .field("channel_id", &self.channel_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Serialize)]
struct CreateMessage<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<AttachmentRef<'a>>,
}

#[derive(Serialize)]
struct AttachmentRef<'a> {
    id: usize,
    filename: &'a str,
}

#[derive(Deserialize)]
struct MessageResponse {
    id: String,
    channel_id: String,
}

impl DiscordPublisher {
    /// Create a publisher for `channel_id` from decrypted credentials.
    pub fn new(credentials: DiscordCredentials, channel_id: impl Into<String>) -> Result<Self> {
        Self::with_timeout(credentials, channel_id, 30)
    }

    /// Create a publisher with a per-request timeout in seconds.
    pub fn with_timeout(
        credentials: DiscordCredentials,
        channel_id: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let channel_id = channel_id.into();
        if channel_id.is_empty() || !channel_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ChannelError::InvalidTarget(format!(
                "Discord channel id must be a numeric snowflake, got '{channel_id}'"
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ChannelError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            bot_token: credentials.bot_token,
            channel_id,
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }

    /// Set the API base URL.
    pub fn with_api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    fn validate(post: &Post) -> Result<()> {
        let len = post.text.chars().count();
        if len > MAX_MESSAGE_CHARS {
            return Err(ChannelError::MessageTooLong {
                len,
                max: MAX_MESSAGE_CHARS,
            });
        }
        if post.text.trim().is_empty() && post.media.is_empty() {
            return Err(ChannelError::InvalidPost(
                "a message needs content or attachments".to_string(),
            ));
        }
        if post.media.len() > MAX_ATTACHMENTS {
            return Err(ChannelError::InvalidPost(format!(
                "at most {MAX_ATTACHMENTS} attachments per message, got {}",
                post.media.len()
            )));
        }
        Ok(())
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.bot_token.expose_secret())
    }
}

#[async_trait]
impl Publisher for DiscordPublisher {
    fn platform(&self) -> Platform {
        Platform::Discord
    }

    async fn publish(&self, post: &Post) -> Result<PublishReceipt> {
        Self::validate(post)?;

        let url = format!(
            "{}/api/v10/channels/{}/messages",
            self.api_base, self.channel_id
        );
        let payload = CreateMessage {
            content: &post.text,
            attachments: post
                .media
                .iter()
                .enumerate()
                .map(|(id, m)| AttachmentRef {
                    id,
                    filename: &m.file_name,
                })
                .collect(),
        };

        let request = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, self.auth_header());

        let request = if post.media.is_empty() {
            request.json(&payload)
        } else {
            let mut form = multipart::Form::new().part(
                "payload_json",
                multipart::Part::text(serde_json::to_string(&payload)?)
                    .mime_str("application/json")?,
            );
            for (i, media) in post.media.iter().enumerate() {
                let part = multipart::Part::bytes(media.data.clone())
                    .file_name(media.file_name.clone())
                    .mime_str(&media.mime_type)?;
                form = form.part(format!("files[{i}]"), part);
            }
            request.multipart(form)
        };

        let message: MessageResponse = check_response(request.send().await?).await?.json().await?;
        info!(
            message_id = %message.id,
            channel_id = %message.channel_id,
            attachments = post.media.len(),
            "discord message published"
        );

        Ok(PublishReceipt {
            platform: Platform::Discord,
            id: message.id,
            url: None,
        })
    }
}
