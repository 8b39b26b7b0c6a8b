//! Twitter/X publisher.
//!
//! Media goes through the v1.1 simple upload endpoint (one request per file,
//! no chunking), then the tweet is created with `POST /2/tweets`. Every
//! request carries an OAuth 1.0a user-context signature.

use std::time::Duration;

use async_trait::async_trait;
use postvault_secrets::{Platform, TwitterCredentials};
use reqwest::{multipart, Client};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::check_response;
use crate::oauth::OAuth1Signer;
use crate::traits::{MediaFile, Post, PublishReceipt, Publisher};
use crate::{ChannelError, Result};

/// Default v2 API base URL.
const DEFAULT_API_BASE: &str = "https://api.twitter.com";

/// Default media upload base URL.
const DEFAULT_UPLOAD_BASE: &str = "https://upload.twitter.com";

/// Maximum tweet length in characters.
pub const MAX_TWEET_CHARS: usize = 280;

/// Maximum number of media items per tweet.
pub const MAX_MEDIA: usize = 4;

/// Publishes tweets for one account.
pub struct TwitterPublisher {
    client: Client,
    signer: OAuth1Signer,
    api_base: String,
    upload_base: String,
}

impl std::fmt::Debug for TwitterPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterPublisher")
            .field("api_base", &self.api_base)
            .field("upload_base", &self.upload_base)
            .finish()
    }
}

#[derive(Serialize)]
struct CreateTweet<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    media: Option<TweetMedia>,
}

#[derive(Serialize)]
struct TweetMedia {
    media_ids: Vec<String>,
}

#[derive(Deserialize)]
struct CreateTweetResponse {
    data: TweetData,
}

#[derive(Deserialize)]
struct TweetData {
    id: String,
}

#[derive(Deserialize)]
struct MediaUploadResponse {
    media_id_string: String,
}

impl TwitterPublisher {
    /// Create a publisher from decrypted credentials.
    pub fn new(credentials: TwitterCredentials) -> Result<Self> {
        Self::with_timeout(credentials, 30)
    }

    /// Create a publisher with a per-request timeout in seconds.
    pub fn with_timeout(credentials: TwitterCredentials, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ChannelError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            signer: OAuth1Signer::new(credentials),
            api_base: DEFAULT_API_BASE.to_string(),
            upload_base: DEFAULT_UPLOAD_BASE.to_string(),
        })
    }

    /// Set the v2 API base URL.
    pub fn with_api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the media upload base URL.
    pub fn with_upload_base(mut self, url: impl Into<String>) -> Self {
        self.upload_base = url.into().trim_end_matches('/').to_string();
        self
    }

    fn validate(post: &Post) -> Result<()> {
        let len = post.text.chars().count();
        if len > MAX_TWEET_CHARS {
            return Err(ChannelError::MessageTooLong {
                len,
                max: MAX_TWEET_CHARS,
            });
        }
        if post.text.trim().is_empty() && post.media.is_empty() {
            return Err(ChannelError::InvalidPost(
                "a tweet needs text or media".to_string(),
            ));
        }
        if post.media.len() > MAX_MEDIA {
            return Err(ChannelError::InvalidPost(format!(
                "at most {MAX_MEDIA} media items per tweet, got {}",
                post.media.len()
            )));
        }
        Ok(())
    }

    /// Upload one media file and return its media id.
    async fn upload_media(&self, media: &MediaFile) -> Result<String> {
        let url = format!("{}/1.1/media/upload.json", self.upload_base);
        let part = multipart::Part::bytes(media.data.clone())
            .file_name(media.file_name.clone())
            .mime_str(&media.mime_type)?;
        let form = multipart::Form::new().part("media", part);

        debug!(file = %media.file_name, bytes = media.data.len(), "uploading media");
        let response = self
            .client
            .post(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                self.signer.authorization_header("POST", &url, &[]),
            )
            .multipart(form)
            .send()
            .await?;

        let uploaded: MediaUploadResponse = check_response(response).await?.json().await?;
        Ok(uploaded.media_id_string)
    }
}

#[async_trait]
impl Publisher for TwitterPublisher {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    async fn publish(&self, post: &Post) -> Result<PublishReceipt> {
        Self::validate(post)?;

        let mut media_ids = Vec::with_capacity(post.media.len());
        for media in &post.media {
            media_ids.push(self.upload_media(media).await?);
        }

        let body = CreateTweet {
            text: &post.text,
            media: (!media_ids.is_empty()).then_some(TweetMedia { media_ids }),
        };

        let url = format!("{}/2/tweets", self.api_base);
        let response = self
            .client
            .post(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                self.signer.authorization_header("POST", &url, &[]),
            )
            .json(&body)
            .send()
            .await?;

        let created: CreateTweetResponse = check_response(response).await?.json().await?;
        info!(tweet_id = %created.data.id, media = post.media.len(), "tweet published");

        Ok(PublishReceipt {
            platform: Platform::Twitter,
            url: Some(format!("https://twitter.com/i/web/status/{}", created.data.id)),
            id: created.data.id,
        })
    }
}
