//! The process-wide credential encryption key.
//!
//! Loaded once at startup from an environment variable. The value may be
//! given either as 64 hex characters or as a raw 32-byte string; anything
//! else refuses to load.

use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Result, SecretError};

/// Key length in bytes (AES-256).
pub const KEY_SIZE: usize = 32;

/// A 256-bit symmetric key, wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    bytes: [u8; KEY_SIZE],
}

impl EncryptionKey {
    /// Build a key from raw bytes. Fails unless exactly 32 bytes are given.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| {
            SecretError::Config(format!(
                "encryption key must be exactly {KEY_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self { bytes })
    }

    /// Parse a configured key value.
    ///
    /// 64 hex characters decode to 32 bytes; otherwise the UTF-8 bytes of
    /// the value are used as-is and must number exactly 32.
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.len() == KEY_SIZE * 2 && trimmed.bytes().all(|b| b.is_ascii_hexdigit()) {
            let mut decoded = hex::decode(trimmed)
                .map_err(|e| SecretError::Config(format!("invalid hex key: {e}")))?;
            let key = Self::from_bytes(&decoded);
            decoded.zeroize();
            return key;
        }

        Self::from_bytes(value.as_bytes()).map_err(|_| {
            SecretError::Config(format!(
                "encryption key must be {KEY_SIZE} raw bytes or {} hex characters, got {} bytes",
                KEY_SIZE * 2,
                value.len()
            ))
        })
    }

    /// Load the key from the environment variable `var`.
    pub fn from_env(var: &str) -> Result<Self> {
        let value = postvault_core::env::get_var(var)
            .ok_or_else(|| SecretError::Config(format!("{var} is not set")))?;
        Self::parse(&value).map_err(|e| match e {
            SecretError::Config(msg) => SecretError::Config(format!("{var}: {msg}")),
            other => other,
        })
    }

    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Hex form, suitable for `POSTVAULT_ENCRYPTION_KEY`.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}
