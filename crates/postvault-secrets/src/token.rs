//! Wire format for encrypted secrets.
//!
//! Two formats are recognised:
//!
//! | Version | Layout | Algorithm |
//! |---------|--------|-----------|
//! | legacy  | `base64(iv) ":" base64(ciphertext)` | AES-256-CBC, PKCS#7 |
//! | v2      | `"v2:" base64(nonce) ":" base64(ciphertext ‖ tag)` | AES-256-GCM |
//!
//! Legacy tokens carry no version tag. Standard base64 never contains `:`
//! and a 16-byte IV encodes to 24 characters, so a leading `v2` segment is
//! unambiguous.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::crypto::{BLOCK_SIZE, CBC_IV_SIZE, GCM_NONCE_SIZE, GCM_TAG_SIZE};
use crate::error::{Result, SecretError};

const V2_PREFIX: &str = "v2";
const SEPARATOR: char = ':';

/// Algorithm/format version of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenVersion {
    /// Untagged AES-256-CBC tokens (no integrity protection).
    LegacyCbc,
    /// AES-256-GCM tokens.
    V2Gcm,
}

impl TokenVersion {
    /// The version used for every new encryption.
    pub const CURRENT: TokenVersion = TokenVersion::V2Gcm;

    /// Expected IV/nonce length for this version.
    pub fn iv_len(self) -> usize {
        match self {
            Self::LegacyCbc => CBC_IV_SIZE,
            Self::V2Gcm => GCM_NONCE_SIZE,
        }
    }

    /// Short name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LegacyCbc => "legacy-cbc",
            Self::V2Gcm => "v2-gcm",
        }
    }
}

impl fmt::Display for TokenVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed token: the IV/nonce and ciphertext, tagged with their version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedToken {
    pub version: TokenVersion,
    pub iv: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

impl EncryptedToken {
    /// Parse a serialized token, validating its structure and lengths.
    ///
    /// Never touches key material; all failures are [`SecretError::Format`].
    pub fn parse(token: &str) -> Result<Self> {
        let (version, body) = match token.split_once(SEPARATOR) {
            Some((V2_PREFIX, rest)) => (TokenVersion::V2Gcm, rest),
            Some(_) => (TokenVersion::LegacyCbc, token),
            None => {
                return Err(SecretError::Format(
                    "missing ':' separator".to_string(),
                ))
            }
        };

        let (iv_b64, ct_b64) = body.split_once(SEPARATOR).ok_or_else(|| {
            SecretError::Format(format!("{version} token is missing its ciphertext segment"))
        })?;
        if ct_b64.contains(SEPARATOR) {
            return Err(SecretError::Format(format!(
                "{version} token has too many ':' separated segments"
            )));
        }
        if iv_b64.is_empty() || ct_b64.is_empty() {
            return Err(SecretError::Format(format!(
                "{version} token has an empty segment"
            )));
        }

        let iv = decode_segment("iv", iv_b64)?;
        let ciphertext = decode_segment("ciphertext", ct_b64)?;

        if iv.len() != version.iv_len() {
            return Err(SecretError::Format(format!(
                "{version} iv must be {} bytes, got {}",
                version.iv_len(),
                iv.len()
            )));
        }

        match version {
            TokenVersion::LegacyCbc if ciphertext.len() % BLOCK_SIZE != 0 => {
                return Err(SecretError::Format(format!(
                    "legacy ciphertext length {} is not a multiple of {BLOCK_SIZE}",
                    ciphertext.len()
                )));
            }
            TokenVersion::V2Gcm if ciphertext.len() < GCM_TAG_SIZE => {
                return Err(SecretError::Format(format!(
                    "v2 ciphertext is shorter than the {GCM_TAG_SIZE}-byte tag"
                )));
            }
            _ => {}
        }

        Ok(Self {
            version,
            iv,
            ciphertext,
        })
    }

    /// Whether this token should be re-encrypted under the current version.
    pub fn is_legacy(&self) -> bool {
        self.version != TokenVersion::CURRENT
    }
}

impl fmt::Display for EncryptedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version == TokenVersion::V2Gcm {
            write!(f, "{V2_PREFIX}{SEPARATOR}")?;
        }
        write!(
            f,
            "{}{SEPARATOR}{}",
            STANDARD.encode(&self.iv),
            STANDARD.encode(&self.ciphertext)
        )
    }
}

fn decode_segment(name: &str, segment: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(segment)
        .map_err(|e| SecretError::Format(format!("{name} segment is not valid base64: {e}")))
}
