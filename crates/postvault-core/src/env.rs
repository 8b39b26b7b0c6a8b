//! Environment variable handling.

use std::env;
use std::path::Path;

/// Get an environment variable, returning None if not set or empty.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
pub fn get_var_or(name: &str, default: &str) -> String {
    get_var(name).unwrap_or_else(|| default.to_string())
}

/// Get an environment variable as a boolean.
pub fn get_bool(name: &str) -> bool {
    get_var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Load `.env` from the working directory, if present.
pub fn load_dotenv() -> Result<(), std::io::Error> {
    load_dotenv_from(Path::new(".env"))
}

/// Load `KEY=value` pairs from `path` into the process environment.
///
/// Variables that are already set are left untouched. Missing files are not
/// an error.
pub fn load_dotenv_from(path: &Path) -> Result<(), std::io::Error> {
    if !path.exists() {
        return Ok(());
    }

    let content = std::fs::read_to_string(path)?;
    for (key, value) in parse_dotenv(&content) {
        if env::var(key).is_err() {
            env::set_var(key, value);
        }
    }
    Ok(())
}

fn parse_dotenv(content: &str) -> Vec<(&str, &str)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            Some((key.trim(), value))
        })
        .collect()
}

/// Common environment variable names.
pub mod vars {
    /// Default variable holding the credential encryption key.
    pub const POSTVAULT_ENCRYPTION_KEY: &str = "POSTVAULT_ENCRYPTION_KEY";

    /// Postvault home directory override.
    pub const POSTVAULT_HOME: &str = "POSTVAULT_HOME";

    /// Postvault config file override.
    pub const POSTVAULT_CONFIG: &str = "POSTVAULT_CONFIG";

    /// Postvault log filter.
    pub const POSTVAULT_LOG: &str = "POSTVAULT_LOG";
}
