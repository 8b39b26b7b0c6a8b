//! Path resolution utilities.

use crate::env::{get_var, vars};
use crate::error::ConfigError;
use std::path::PathBuf;

/// Get the Postvault base directory (`$POSTVAULT_HOME` or `~/.postvault`).
pub fn base_dir() -> Result<PathBuf, ConfigError> {
    if let Some(home) = get_var(vars::POSTVAULT_HOME) {
        return Ok(PathBuf::from(home));
    }

    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::Validation("Could not determine home directory".to_string())
    })?;
    Ok(home.join(".postvault"))
}

/// Get the main config file path (~/.postvault/postvault.json5).
pub fn config_file() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("postvault.json5"))
}

/// Get the encrypted credentials directory (~/.postvault/credentials).
pub fn credentials_dir() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("credentials"))
}
