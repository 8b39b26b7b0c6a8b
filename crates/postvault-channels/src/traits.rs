//! Core publisher trait and post types.

use std::fmt::Debug;
use std::path::Path;

use async_trait::async_trait;
use postvault_secrets::Platform;
use serde::Serialize;

use crate::Result;

/// A media file attached to a post.
#[derive(Clone)]
pub struct MediaFile {
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl MediaFile {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Read a local file, guessing its MIME type from the extension.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let data = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(Self::new(file_name, mime_type, data))
    }
}

impl Debug for MediaFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaFile")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Content to publish.
#[derive(Debug, Clone, Default)]
pub struct Post {
    pub text: String,
    pub media: Vec<MediaFile>,
}

impl Post {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            media: Vec::new(),
        }
    }

    pub fn with_media(mut self, media: MediaFile) -> Self {
        self.media.push(media);
        self
    }
}

/// What the platform returned for a successful post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishReceipt {
    pub platform: Platform,
    /// Platform-assigned id of the tweet/message.
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Posts content to one platform account.
#[async_trait]
pub trait Publisher: Send + Sync + Debug {
    /// The platform this publisher posts to.
    fn platform(&self) -> Platform;

    /// Publish a post.
    async fn publish(&self, post: &Post) -> Result<PublishReceipt>;
}
