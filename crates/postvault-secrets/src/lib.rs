//! Credential encryption and encrypted credential storage for Postvault.
//!
//! Platform secrets (Twitter OAuth keys, Discord bot tokens) are encrypted
//! with a single process-wide 32-byte key before they reach a
//! [`CredentialStore`], and decrypted only when a publisher is about to use
//! them. New tokens use AES-256-GCM; tokens written by the legacy
//! AES-256-CBC format remain readable.

pub mod cipher;
pub mod crypto;
pub mod error;
pub mod key;
pub mod service;
pub mod store;
pub mod token;
pub mod types;

pub use cipher::CredentialCipher;
pub use error::{Result, SecretError};
pub use key::EncryptionKey;
pub use service::{CredentialService, LoadedCredential, MigrationReport};
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use token::{EncryptedToken, TokenVersion};
pub use types::{
    CredentialRecord, CredentialSummary, DecryptedSecret, DiscordCredentials, Platform,
    PlatformCredentials, TwitterCredentials,
};
