//! Error types for platform publishers.

use postvault_secrets::SecretError;
use thiserror::Error;

/// Result type for publisher operations.
pub type Result<T> = std::result::Result<T, ChannelError>;

/// Publisher error types.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The platform rejected the credentials.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// The platform asked us to back off. Surfaced, never retried here.
    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    /// The post violates a platform limit before any request is made.
    #[error("Invalid post: {0}")]
    InvalidPost(String),

    #[error("Message too long: {len} > {max}")]
    MessageTooLong { len: usize, max: usize },

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// Non-success response from the platform API.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credential error: {0}")]
    Credentials(#[from] SecretError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ChannelError {
    /// Map a non-success HTTP response to an error.
    pub fn from_status(status: u16, retry_after: Option<&str>, body: &str) -> Self {
        match status {
            401 | 403 => Self::AuthFailed(truncate(body)),
            429 => Self::RateLimited {
                retry_after_ms: retry_after
                    .and_then(|v| v.trim().parse::<f64>().ok())
                    .map(|secs| (secs * 1000.0) as u64),
            },
            _ => Self::Api {
                status,
                message: truncate(body),
            },
        }
    }
}

/// Turn a non-success response into a [`ChannelError`].
pub(crate) async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.unwrap_or_default();
    Err(ChannelError::from_status(
        status.as_u16(),
        retry_after.as_deref(),
        &body,
    ))
}

fn truncate(body: &str) -> String {
    const MAX: usize = 512;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
