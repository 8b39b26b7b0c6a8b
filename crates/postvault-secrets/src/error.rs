//! Error types for credential encryption and storage.

use thiserror::Error;

/// Errors that can occur during secret operations.
#[derive(Debug, Error)]
pub enum SecretError {
    /// The encryption key is missing or malformed. Fatal at startup.
    #[error("Key configuration error: {0}")]
    Config(String),

    /// A stored token does not have the expected shape.
    #[error("Malformed token: {0}")]
    Format(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// A stored credential could not be decrypted.
    #[error("Stored credential {record} is corrupt (field '{field}'): {source}")]
    Corrupt {
        record: String,
        field: String,
        #[source]
        source: Box<SecretError>,
    },

    #[error("Credential not found: {0}")]
    NotFound(String),

    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Invalid record id: {0}")]
    InvalidName(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SecretError {
    /// True for failures caused by persistent data problems (bad token or
    /// key mismatch). These are never worth retrying.
    pub fn is_corrupt_data(&self) -> bool {
        matches!(
            self,
            Self::Format(_) | Self::DecryptionFailed(_) | Self::Corrupt { .. }
        )
    }
}

/// Convenience result alias for secret operations.
pub type Result<T> = std::result::Result<T, SecretError>;
