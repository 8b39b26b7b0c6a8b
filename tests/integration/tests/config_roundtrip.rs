//! Config save/load roundtrip integration tests.

use postvault_core::config::Config;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_config_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("postvault.json5");

    let config = Config::default();
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.secrets.key_env, config.secrets.key_env);
    assert_eq!(loaded.twitter.api_base, config.twitter.api_base);
    assert_eq!(loaded.discord.api_base, config.discord.api_base);
    assert_eq!(loaded.http.timeout_secs, config.http.timeout_secs);
}

#[test]
fn test_config_modify_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("postvault.json5");

    let mut config = Config::default();
    config.secrets.store_dir = Some(PathBuf::from("/var/lib/postvault"));
    config.http.timeout_secs = 5;
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.secrets.store_dir, Some(PathBuf::from("/var/lib/postvault")));
    assert_eq!(loaded.http.timeout_secs, 5);
    loaded.validate().unwrap();
}

#[test]
fn test_saved_config_never_holds_key_material() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("postvault.json5");
    Config::default().save(&path).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("POSTVAULT_ENCRYPTION_KEY"));
    assert!(!raw.contains("\"key\""));
}

#[test]
fn test_config_load_nonexistent() {
    let result = Config::load(Path::new("/nonexistent/postvault.json5"));
    assert!(result.is_err());
}

#[test]
fn test_config_parse_invalid() {
    let result = Config::parse("not valid json");
    assert!(result.is_err());
}
