//! Shared fixtures for the integration tests.
//!
//! Every test gets its own temp directory, config file, and key variable.
//! Tests in one binary run in parallel, so each caller must pass a distinct
//! `key_env` name.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use postvault_core::Config;
use postvault_secrets::{CredentialCipher, CredentialService, EncryptionKey, FileCredentialStore};
use tempfile::TempDir;

pub struct Workspace {
    pub dir: TempDir,
    pub config_path: PathBuf,
    pub key_env: String,
}

impl Workspace {
    /// A workspace with default endpoints and a freshly generated key.
    pub fn new(key_env: &str) -> Self {
        Self::with_config(key_env, |_| {})
    }

    /// A workspace whose config is adjusted by `edit` before it is saved.
    pub fn with_config(key_env: &str, edit: impl FnOnce(&mut Config)) -> Self {
        let dir = TempDir::new().unwrap();
        std::env::set_var(key_env, EncryptionKey::generate().to_hex());

        let mut config = Config::default();
        config.secrets.key_env = key_env.to_string();
        config.secrets.store_dir = Some(dir.path().join("credentials"));
        edit(&mut config);

        let config_path = dir.path().join("postvault.json5");
        config.save(&config_path).unwrap();

        Self {
            dir,
            config_path,
            key_env: key_env.to_string(),
        }
    }

    pub fn store_dir(&self) -> PathBuf {
        self.dir.path().join("credentials")
    }

    /// Service over the same key and store the CLI uses.
    pub fn service(&self) -> CredentialService {
        let cipher = CredentialCipher::from_env(&self.key_env).unwrap();
        let store = FileCredentialStore::new(self.store_dir());
        CredentialService::new(Arc::new(cipher), Arc::new(store))
    }

    /// `postvault --config <path> <args...>`
    pub fn argv<'a>(&'a self, args: &[&'a str]) -> Vec<&'a str> {
        let mut argv = vec!["postvault", "--config", path_str(&self.config_path)];
        argv.extend_from_slice(args);
        argv
    }
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}
