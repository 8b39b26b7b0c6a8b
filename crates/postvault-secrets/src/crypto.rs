//! Raw AES-256 primitives behind the token formats.
//!
//! AES-256-GCM with a random 96-bit nonce is used for all new tokens. The
//! CBC functions exist so tokens written by the legacy format can still be
//! read (and, for interop, produced). CBC has no authentication: a wrong key
//! or flipped ciphertext byte is only caught when the PKCS#7 padding happens
//! to come out invalid.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;

use crate::error::{Result, SecretError};

/// AES block size.
pub const BLOCK_SIZE: usize = 16;
/// Legacy CBC IV length.
pub const CBC_IV_SIZE: usize = 16;
/// GCM nonce length (96 bits).
pub const GCM_NONCE_SIZE: usize = 12;
/// GCM authentication tag length (128 bits).
pub const GCM_TAG_SIZE: usize = 16;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Fill a fresh buffer of `N` random bytes.
fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    rand::thread_rng().fill_bytes(&mut buf);
    buf
}

/// Encrypt with AES-256-GCM under a fresh nonce.
///
/// Returns `(nonce, ciphertext_with_tag)`.
pub fn gcm_encrypt(key: &[u8; 32], plaintext: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    let nonce_bytes = random_bytes::<GCM_NONCE_SIZE>();

    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| SecretError::EncryptionFailed(e.to_string()))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| SecretError::EncryptionFailed(e.to_string()))?;

    Ok((nonce_bytes.to_vec(), ciphertext))
}

/// Decrypt and authenticate an AES-256-GCM ciphertext.
pub fn gcm_decrypt(key: &[u8; 32], nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if nonce.len() != GCM_NONCE_SIZE {
        return Err(SecretError::DecryptionFailed(format!(
            "nonce must be {GCM_NONCE_SIZE} bytes, got {}",
            nonce.len()
        )));
    }

    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| SecretError::DecryptionFailed(e.to_string()))?;
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| SecretError::DecryptionFailed("authentication tag mismatch".to_string()))
}

/// Encrypt with AES-256-CBC/PKCS#7 under a fresh IV.
///
/// Returns `(iv, ciphertext)`.
pub fn cbc_encrypt(key: &[u8; 32], plaintext: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    let iv = random_bytes::<CBC_IV_SIZE>();

    let ciphertext = Aes256CbcEnc::new_from_slices(key, &iv)
        .map_err(|e| SecretError::EncryptionFailed(e.to_string()))?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    Ok((iv.to_vec(), ciphertext))
}

/// Decrypt an AES-256-CBC/PKCS#7 ciphertext.
pub fn cbc_decrypt(key: &[u8; 32], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    Aes256CbcDec::new_from_slices(key, iv)
        .map_err(|e| SecretError::DecryptionFailed(e.to_string()))?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| SecretError::DecryptionFailed("invalid padding".to_string()))
}
