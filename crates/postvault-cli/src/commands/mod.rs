//! CLI command implementations.

pub mod credentials;
pub mod key;
pub mod publish;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use postvault_core::{Config, SecretString};
use postvault_secrets::{CredentialCipher, CredentialService, FileCredentialStore};
use tracing::debug;

/// Load and validate the config from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(p) => Config::load(p)
            .with_context(|| format!("Failed to load config from {}", p.display()))?,
        None => Config::load_default().context("Failed to load config")?,
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Build the credential service: key from the environment, file store on disk.
///
/// Fails before touching the store when the key is missing or malformed.
pub fn open_service(config: &Config) -> anyhow::Result<CredentialService> {
    let key_env = &config.secrets.key_env;
    let cipher = CredentialCipher::from_env(key_env).with_context(|| {
        format!("Encryption key unavailable; set {key_env} (see `postvault key generate`)")
    })?;

    let store = match &config.secrets.store_dir {
        Some(dir) => FileCredentialStore::new(dir),
        None => FileCredentialStore::from_default_dir()
            .context("Failed to initialize credential store")?,
    };
    debug!(store = %store.base_dir().display(), "opened credential store");

    Ok(CredentialService::new(Arc::new(cipher), Arc::new(store)))
}

/// Use `given` if present, otherwise prompt for hidden input.
pub(crate) fn read_secret(field: &str, given: Option<String>) -> anyhow::Result<SecretString> {
    let value = match given {
        Some(v) => v,
        None => rpassword::prompt_password(format!("Enter {field}: "))
            .with_context(|| format!("Failed to read {field}"))?,
    };

    if value.trim().is_empty() {
        anyhow::bail!("{field} must not be empty");
    }
    Ok(SecretString::new(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("postvault.json5");
        std::fs::write(&path, "{ http: { timeout_secs: 5 } }").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.http.timeout_secs, 5);
    }

    #[test]
    fn test_load_config_missing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("nope.json5"))).is_err());
    }

    #[test]
    fn test_load_config_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("postvault.json5");
        std::fs::write(&path, "{ discord: { api_base: \"ftp://discord.com\" } }").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("discord.api_base"));
    }

    #[test]
    fn test_open_service_needs_key() {
        let mut config = Config::default();
        config.secrets.key_env = "POSTVAULT_TEST_UNSET_KEY".to_string();
        let err = open_service(&config).err().unwrap();
        assert!(err.to_string().contains("POSTVAULT_TEST_UNSET_KEY"));
    }

    #[test]
    fn test_read_secret_given() {
        assert_eq!(
            read_secret("token", Some("abc".into())).unwrap().expose_secret(),
            "abc"
        );
        assert!(read_secret("token", Some("  ".into())).is_err());
    }
}
