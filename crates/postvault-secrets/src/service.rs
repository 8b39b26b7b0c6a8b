//! Credential registration and retrieval.
//!
//! [`CredentialService`] is where encryption meets storage: secrets are
//! encrypted field by field before a record is handed to the store, and
//! decrypted only when a caller asks for usable [`PlatformCredentials`].

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::cipher::CredentialCipher;
use crate::error::{Result, SecretError};
use crate::store::CredentialStore;
use crate::types::{CredentialRecord, CredentialSummary, PlatformCredentials};

const MAX_OWNER_ID_LEN: usize = 128;

/// A record decrypted for immediate use.
#[derive(Debug)]
pub struct LoadedCredential {
    pub summary: CredentialSummary,
    pub metadata: BTreeMap<String, String>,
    pub credentials: PlatformCredentials,
}

/// Outcome of [`CredentialService::migrate_legacy`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub records_scanned: usize,
    pub records_updated: usize,
    pub tokens_upgraded: usize,
    /// Records left untouched because a token could not be decrypted.
    pub failed: Vec<String>,
}

/// Encrypting front door to a [`CredentialStore`].
#[derive(Clone)]
pub struct CredentialService {
    cipher: Arc<CredentialCipher>,
    store: Arc<dyn CredentialStore>,
}

impl CredentialService {
    pub fn new(cipher: Arc<CredentialCipher>, store: Arc<dyn CredentialStore>) -> Self {
        Self { cipher, store }
    }

    pub fn cipher(&self) -> &Arc<CredentialCipher> {
        &self.cipher
    }

    /// Encrypt and store credentials for `owner_id`.
    pub async fn register(
        &self,
        owner_id: &str,
        credentials: &PlatformCredentials,
        label: Option<String>,
        metadata: BTreeMap<String, String>,
    ) -> Result<CredentialSummary> {
        validate_owner_id(owner_id)?;

        let mut record = CredentialRecord::new(owner_id, credentials.platform());
        record.label = label;
        record.metadata = metadata;
        record.secrets = self.encrypt_fields(credentials)?;

        let summary = record.summary();
        self.store.insert(record).await?;

        info!(
            id = %summary.id,
            owner = %summary.owner_id,
            platform = %summary.platform,
            "registered credentials"
        );
        Ok(summary)
    }

    /// Fetch a record and decrypt its secrets.
    ///
    /// A token that fails to parse or decrypt is reported as
    /// [`SecretError::Corrupt`]. The cause is persistent, so callers should
    /// report the failure rather than retry.
    pub async fn load(&self, id: &str) -> Result<LoadedCredential> {
        let record = self.store.get(id).await?;
        let credentials = self.decrypt_record(&record)?;
        debug!(id, platform = %record.platform, "decrypted credentials");

        Ok(LoadedCredential {
            summary: record.summary(),
            metadata: record.metadata,
            credentials,
        })
    }

    /// Metadata for one record, without touching its secrets.
    pub async fn summary(&self, id: &str) -> Result<CredentialSummary> {
        Ok(self.store.get(id).await?.summary())
    }

    /// Metadata for every record owned by `owner_id`.
    pub async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<CredentialSummary>> {
        Ok(self
            .store
            .list_by_owner(owner_id)
            .await?
            .iter()
            .map(CredentialRecord::summary)
            .collect())
    }

    /// Metadata for every record.
    pub async fn list_all(&self) -> Result<Vec<CredentialSummary>> {
        Ok(self
            .store
            .list()
            .await?
            .iter()
            .map(CredentialRecord::summary)
            .collect())
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        self.store.delete(id).await?;
        info!(id, "removed credentials");
        Ok(())
    }

    /// Replace a record's secrets with freshly encrypted `credentials`.
    pub async fn rotate(&self, id: &str, credentials: &PlatformCredentials) -> Result<()> {
        let mut record = self.store.get(id).await?;
        if record.platform != credentials.platform() {
            return Err(SecretError::InvalidCredential(format!(
                "record {id} holds {} credentials, got {}",
                record.platform,
                credentials.platform()
            )));
        }

        record.secrets = self.encrypt_fields(credentials)?;
        record.updated_at = Utc::now();
        self.store.update(record).await?;

        info!(id, "rotated credentials");
        Ok(())
    }

    /// Re-encrypt every legacy token in the store under the current format.
    pub async fn migrate_legacy(&self) -> Result<MigrationReport> {
        let mut report = MigrationReport::default();

        for mut record in self.store.list().await? {
            report.records_scanned += 1;

            match self.upgrade_tokens(&mut record) {
                Ok(0) => {}
                Ok(upgraded) => {
                    record.updated_at = Utc::now();
                    self.store.update(record).await?;
                    report.records_updated += 1;
                    report.tokens_upgraded += upgraded;
                }
                Err(e) => {
                    warn!(id = %record.id, error = %e, "cannot migrate credential record");
                    report.failed.push(record.id);
                }
            }
        }

        info!(
            scanned = report.records_scanned,
            updated = report.records_updated,
            failed = report.failed.len(),
            "legacy token migration finished"
        );
        Ok(report)
    }

    /// Upgrade legacy tokens in place. All-or-nothing per record.
    fn upgrade_tokens(&self, record: &mut CredentialRecord) -> Result<usize> {
        let mut upgraded = BTreeMap::new();
        for (field, token) in &record.secrets {
            let needs = CredentialCipher::needs_migration(token)
                .map_err(|e| corrupt(&record.id, field, e))?;
            if needs {
                let fresh = self
                    .cipher
                    .reencrypt(token)
                    .map_err(|e| corrupt(&record.id, field, e))?;
                upgraded.insert(field.clone(), fresh);
            }
        }

        let count = upgraded.len();
        record.secrets.extend(upgraded);
        Ok(count)
    }

    fn encrypt_fields(&self, credentials: &PlatformCredentials) -> Result<BTreeMap<String, String>> {
        credentials
            .fields()
            .into_iter()
            .map(|(name, value)| {
                if value.expose_secret().trim().is_empty() {
                    return Err(SecretError::InvalidCredential(format!(
                        "'{name}' must not be empty"
                    )));
                }
                Ok((name.to_string(), self.cipher.encrypt(value.expose_secret())?))
            })
            .collect()
    }

    fn decrypt_record(&self, record: &CredentialRecord) -> Result<PlatformCredentials> {
        let mut fields = BTreeMap::new();
        for field in record.platform.secret_fields() {
            let token = record.secrets.get(*field).ok_or_else(|| {
                corrupt(
                    &record.id,
                    field,
                    SecretError::Format("token is missing".to_string()),
                )
            })?;
            let plaintext = self
                .cipher
                .decrypt(token)
                .map_err(|e| corrupt(&record.id, field, e))?;
            fields.insert(field.to_string(), plaintext.into_secret_string());
        }

        PlatformCredentials::from_fields(record.platform, fields)
    }
}

fn corrupt(record_id: &str, field: &str, source: SecretError) -> SecretError {
    SecretError::Corrupt {
        record: record_id.to_string(),
        field: field.to_string(),
        source: Box::new(source),
    }
}

fn validate_owner_id(owner_id: &str) -> Result<()> {
    if owner_id.trim().is_empty() {
        return Err(SecretError::InvalidCredential(
            "owner id must not be empty".to_string(),
        ));
    }
    if owner_id.len() > MAX_OWNER_ID_LEN {
        return Err(SecretError::InvalidCredential(format!(
            "owner id exceeds {MAX_OWNER_ID_LEN} characters"
        )));
    }
    Ok(())
}
