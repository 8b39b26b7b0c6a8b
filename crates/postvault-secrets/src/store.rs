//! Credential storage backends.
//!
//! Defines the [`CredentialStore`] trait and two implementations:
//! [`MemoryCredentialStore`] for tests and embedding, and
//! [`FileCredentialStore`], which keeps one JSON file per record under
//! `~/.postvault/credentials/`. Stores only ever see tokens; encryption
//! happens in [`crate::service::CredentialService`] before a record arrives.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{Result, SecretError};
use crate::types::CredentialRecord;

/// Maximum allowed length for a record id.
const MAX_ID_LEN: usize = 128;

/// Async trait for credential storage backends.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persist a new record. Fails if the id is already taken.
    async fn insert(&self, record: CredentialRecord) -> Result<()>;

    /// Fetch a record by id.
    async fn get(&self, id: &str) -> Result<CredentialRecord>;

    /// Overwrite an existing record.
    async fn update(&self, record: CredentialRecord) -> Result<()>;

    /// Delete a record by id.
    async fn delete(&self, id: &str) -> Result<()>;

    /// All records, oldest first.
    async fn list(&self) -> Result<Vec<CredentialRecord>>;

    /// Records belonging to `owner_id`, oldest first.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<CredentialRecord>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|r| r.owner_id == owner_id)
            .collect())
    }
}

fn sort_records(records: &mut [CredentialRecord]) {
    records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}

/// In-memory credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    records: RwLock<HashMap<String, CredentialRecord>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn insert(&self, record: CredentialRecord) -> Result<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(SecretError::StorageError(format!(
                "credential {} already exists",
                record.id
            )));
        }
        records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<CredentialRecord> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| SecretError::NotFound(id.to_string()))
    }

    async fn update(&self, record: CredentialRecord) -> Result<()> {
        let mut records = self.records.write().await;
        match records.get_mut(&record.id) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(SecretError::NotFound(record.id)),
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.records
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| SecretError::NotFound(id.to_string()))
    }

    async fn list(&self) -> Result<Vec<CredentialRecord>> {
        let mut records: Vec<_> = self.records.read().await.values().cloned().collect();
        sort_records(&mut records);
        Ok(records)
    }
}

/// A file-system-backed credential store.
///
/// Each record is stored as `{base_dir}/{id}.json`. Files are created with
/// mode `0600` and the directory with `0700` on Unix.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    base_dir: PathBuf,
}

impl FileCredentialStore {
    /// Create a new store rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Create a store in the default directory (`~/.postvault/credentials/`).
    pub fn from_default_dir() -> Result<Self> {
        let base_dir = postvault_core::paths::credentials_dir()
            .map_err(|e| SecretError::StorageError(e.to_string()))?;
        Ok(Self::new(base_dir))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Ensure the base directory exists with restrictive permissions.
    async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.base_dir).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            tokio::fs::set_permissions(&self.base_dir, perms).await?;
        }

        Ok(())
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.base_dir.join(format!("{id}.json"))
    }

    async fn write_record(&self, record: &CredentialRecord) -> Result<()> {
        self.ensure_dir().await?;

        let json = serde_json::to_string_pretty(record)?;
        let path = self.record_path(&record.id);
        debug!(id = %record.id, path = %path.display(), "writing credential record");
        write_private_file(&path, json.as_bytes()).await
    }
}

/// Validate that a record id contains only safe characters.
///
/// Allowed: ASCII alphanumeric, underscore, hyphen. Max length 128.
fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(SecretError::InvalidName("id must not be empty".to_string()));
    }
    if id.len() > MAX_ID_LEN {
        return Err(SecretError::InvalidName(format!(
            "id exceeds maximum length of {MAX_ID_LEN} characters"
        )));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(SecretError::InvalidName(format!(
            "id contains invalid characters (allowed: alphanumeric, underscore, hyphen): {id}"
        )));
    }
    Ok(())
}

/// Write `data` to `path` with mode 0600 on Unix, replacing it atomically.
///
/// The temp file is created with its final mode and removed if the write
/// or rename fails.
async fn write_private_file(path: &Path, data: &[u8]) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let result = write_then_rename(&tmp, path, data).await;
    if result.is_err() {
        if let Err(e) = tokio::fs::remove_file(&tmp).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %tmp.display(), error = %e, "failed to remove temp file");
            }
        }
    }
    result
}

async fn write_then_rename(tmp: &Path, path: &Path, data: &[u8]) -> Result<()> {
    // A leftover from a crashed write may carry wider permissions.
    match tokio::fs::remove_file(tmp).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
        _ => {}
    }

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(tmp).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(tmp, path).await?;
    Ok(())
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn insert(&self, record: CredentialRecord) -> Result<()> {
        validate_id(&record.id)?;
        if self.record_path(&record.id).exists() {
            return Err(SecretError::StorageError(format!(
                "credential {} already exists",
                record.id
            )));
        }
        self.write_record(&record).await
    }

    async fn get(&self, id: &str) -> Result<CredentialRecord> {
        validate_id(id)?;

        let path = self.record_path(id);
        if !path.exists() {
            return Err(SecretError::NotFound(id.to_string()));
        }

        let data = tokio::fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&data)?)
    }

    async fn update(&self, record: CredentialRecord) -> Result<()> {
        validate_id(&record.id)?;
        if !self.record_path(&record.id).exists() {
            return Err(SecretError::NotFound(record.id));
        }
        self.write_record(&record).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        validate_id(id)?;

        let path = self.record_path(id);
        if !path.exists() {
            return Err(SecretError::NotFound(id.to_string()));
        }

        debug!(id, path = %path.display(), "deleting credential record");
        tokio::fs::remove_file(&path).await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<CredentialRecord>> {
        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.base_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            match tokio::fs::read_to_string(&path).await {
                Ok(data) => match serde_json::from_str::<CredentialRecord>(&data) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        warn!(path = %path.display(), "skipping malformed credential file: {e}");
                    }
                },
                Err(e) => {
                    warn!(path = %path.display(), "could not read credential file: {e}");
                }
            }
        }

        sort_records(&mut records);
        Ok(records)
    }
}
