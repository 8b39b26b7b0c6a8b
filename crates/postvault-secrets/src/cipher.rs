//! The credential cipher: plaintext secret strings in, opaque tokens out.
//!
//! A [`CredentialCipher`] owns the process key and is shared by reference
//! (usually `Arc<CredentialCipher>`) between everything that stores or
//! publishes credentials. It holds no mutable state, so concurrent use needs
//! no locking; each call draws its own nonce and allocates its own buffers.

use postvault_core::SecretString;
use tracing::warn;

use crate::crypto;
use crate::error::{Result, SecretError};
use crate::key::EncryptionKey;
use crate::token::{EncryptedToken, TokenVersion};
use crate::types::DecryptedSecret;

/// Encrypts and decrypts credential strings under a single key.
#[derive(Debug)]
pub struct CredentialCipher {
    key: EncryptionKey,
}

impl CredentialCipher {
    pub fn new(key: EncryptionKey) -> Self {
        Self { key }
    }

    /// Build a cipher from the key in environment variable `var`.
    ///
    /// Intended for process start: a missing or mis-sized key is a
    /// [`SecretError::Config`] and the caller should refuse to continue.
    pub fn from_env(var: &str) -> Result<Self> {
        EncryptionKey::from_env(var).map(Self::new)
    }

    /// Encrypt `plaintext` into a current-version token.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        self.encrypt_with(TokenVersion::CURRENT, plaintext)
    }

    /// Encrypt `plaintext` into a token of the given version.
    ///
    /// Only use [`TokenVersion::LegacyCbc`] when a reader that predates the
    /// v2 format has to consume the token.
    pub fn encrypt_with(&self, version: TokenVersion, plaintext: &str) -> Result<String> {
        let key = self.key.as_bytes();
        let (iv, ciphertext) = match version {
            TokenVersion::V2Gcm => crypto::gcm_encrypt(key, plaintext.as_bytes())?,
            TokenVersion::LegacyCbc => crypto::cbc_encrypt(key, plaintext.as_bytes())?,
        };

        Ok(EncryptedToken {
            version,
            iv,
            ciphertext,
        }
        .to_string())
    }

    /// Decrypt a token of any supported version.
    pub fn decrypt(&self, token: &str) -> Result<DecryptedSecret> {
        let parsed = EncryptedToken::parse(token)?;
        self.decrypt_token(&parsed)
    }

    /// Decrypt an already-parsed token.
    pub fn decrypt_token(&self, token: &EncryptedToken) -> Result<DecryptedSecret> {
        let key = self.key.as_bytes();
        let plaintext = match token.version {
            TokenVersion::V2Gcm => crypto::gcm_decrypt(key, &token.iv, &token.ciphertext)?,
            TokenVersion::LegacyCbc => crypto::cbc_decrypt(key, &token.iv, &token.ciphertext)?,
        };

        SecretString::from_utf8(plaintext)
            .map(DecryptedSecret::from)
            .map_err(|_| SecretError::DecryptionFailed("plaintext is not valid UTF-8".to_string()))
    }

    /// Decrypt `token` and encrypt its plaintext as a current-version token.
    pub fn reencrypt(&self, token: &str) -> Result<String> {
        let parsed = EncryptedToken::parse(token)?;
        if parsed.is_legacy() {
            warn!(version = %parsed.version, "re-encrypting legacy token");
        }

        let plaintext = self.decrypt_token(&parsed)?;
        self.encrypt(plaintext.expose())
    }

    /// Whether `token` parses as a version older than [`TokenVersion::CURRENT`].
    pub fn needs_migration(token: &str) -> Result<bool> {
        EncryptedToken::parse(token).map(|t| t.is_legacy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    fn cipher() -> CredentialCipher {
        CredentialCipher::new(EncryptionKey::generate())
    }

    const SAMPLES: &[&str] = &[
        "",
        "a",
        "AAAAAAAAAAAAAAAAAAAAAMLheAAAAAAA0%2BuSeid%2BULvsea4JtiGRiSDSJSI",
        "exactly sixteen!",
        "パスワード🔑 with mixed scripts",
    ];

    #[test]
    fn test_round_trip_current() {
        let cipher = cipher();
        for s in SAMPLES {
            let token = cipher.encrypt(s).unwrap();
            assert!(token.starts_with("v2:"));
            assert_eq!(cipher.decrypt(&token).unwrap().expose(), *s);
        }
    }

    #[test]
    fn test_round_trip_legacy() {
        let cipher = cipher();
        for s in SAMPLES {
            let token = cipher.encrypt_with(TokenVersion::LegacyCbc, s).unwrap();
            assert!(!token.starts_with("v2:"));
            assert_eq!(token.matches(':').count(), 1);
            assert_eq!(cipher.decrypt(&token).unwrap().expose(), *s);
        }
    }

    #[test]
    fn test_same_input_different_tokens() {
        let cipher = cipher();
        for version in [TokenVersion::V2Gcm, TokenVersion::LegacyCbc] {
            let a = cipher.encrypt_with(version, "same secret").unwrap();
            let b = cipher.encrypt_with(version, "same secret").unwrap();
            assert_ne!(a, b);
            assert_eq!(cipher.decrypt(&a).unwrap().expose(), "same secret");
            assert_eq!(cipher.decrypt(&b).unwrap().expose(), "same secret");
        }
    }

    fn flip_ciphertext_byte(token: &str, index_from_end: usize) -> String {
        let mut parsed = EncryptedToken::parse(token).unwrap();
        let idx = parsed.ciphertext.len() - 1 - index_from_end;
        parsed.ciphertext[idx] ^= 0x01;
        parsed.to_string()
    }

    #[test]
    fn test_tamper_detected_current() {
        let cipher = cipher();
        let token = cipher.encrypt("important secret").unwrap();
        for i in 0..EncryptedToken::parse(&token).unwrap().ciphertext.len() {
            let tampered = flip_ciphertext_byte(&token, i);
            assert!(matches!(
                cipher.decrypt(&tampered),
                Err(SecretError::DecryptionFailed(_))
            ));
        }
    }

    /// Legacy CBC tokens carry no MAC. A flipped byte is only caught when the
    /// padding of the final block comes out invalid, which misses roughly one
    /// time in 256. The assertion allows for that.
    #[test]
    fn test_tamper_detected_legacy_best_effort() {
        let cipher = cipher();
        let trials = 64;
        let mut detected = 0;

        for _ in 0..trials {
            let token = cipher
                .encrypt_with(TokenVersion::LegacyCbc, "important secret")
                .unwrap();
            let tampered = flip_ciphertext_byte(&token, 0);
            match cipher.decrypt(&tampered) {
                Err(_) => detected += 1,
                Ok(plain) => assert_ne!(plain.expose(), "important secret"),
            }
        }

        assert!(detected >= trials - 8, "only {detected}/{trials} detected");
    }

    #[test]
    fn test_format_errors() {
        let cipher = cipher();
        let valid = cipher.encrypt("x").unwrap();
        let legacy = cipher.encrypt_with(TokenVersion::LegacyCbc, "x").unwrap();
        let (iv, _) = legacy.split_once(':').unwrap();

        let cases = [
            "no-separator".to_string(),
            valid.replacen(':', "", 2),
            format!("{iv}:@@not-base64@@"),
            format!("!!!:{}", STANDARD.encode([0u8; 16])),
            format!("{valid}:extra"),
        ];
        for case in cases {
            assert!(
                matches!(cipher.decrypt(&case), Err(SecretError::Format(_))),
                "{case}"
            );
        }
    }

    #[test]
    fn test_wrong_key_fails() {
        let k1 = cipher();
        let k2 = cipher();

        let token = k1.encrypt("sensitive data").unwrap();
        assert!(matches!(
            k2.decrypt(&token),
            Err(SecretError::DecryptionFailed(_))
        ));

        let legacy = k1
            .encrypt_with(TokenVersion::LegacyCbc, "sensitive data")
            .unwrap();
        if let Ok(plain) = k2.decrypt(&legacy) {
            assert_ne!(plain.expose(), "sensitive data");
        }
    }

    #[test]
    fn test_from_env_startup_validation() {
        std::env::set_var("POSTVAULT_TEST_CIPHER_KEY", "0123456789abcdef0123456789abcdef");
        assert!(CredentialCipher::from_env("POSTVAULT_TEST_CIPHER_KEY").is_ok());

        std::env::set_var("POSTVAULT_TEST_CIPHER_BAD", "0123456789abcdef");
        assert!(matches!(
            CredentialCipher::from_env("POSTVAULT_TEST_CIPHER_BAD"),
            Err(SecretError::Config(_))
        ));
    }

    #[test]
    fn test_reencrypt_upgrades_legacy() {
        let cipher = cipher();
        let legacy = cipher
            .encrypt_with(TokenVersion::LegacyCbc, "rotate me")
            .unwrap();
        assert!(CredentialCipher::needs_migration(&legacy).unwrap());

        let upgraded = cipher.reencrypt(&legacy).unwrap();
        assert!(!CredentialCipher::needs_migration(&upgraded).unwrap());
        assert_eq!(cipher.decrypt(&upgraded).unwrap().expose(), "rotate me");
    }

    #[test]
    fn test_shared_across_threads() {
        let cipher = std::sync::Arc::new(cipher());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cipher = cipher.clone();
                std::thread::spawn(move || {
                    let value = format!("token-{i}");
                    let token = cipher.encrypt(&value).unwrap();
                    assert_eq!(cipher.decrypt(&token).unwrap().expose(), value);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
    }
}
