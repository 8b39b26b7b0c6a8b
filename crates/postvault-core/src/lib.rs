//! # postvault-core
//!
//! Core types, configuration, and utilities for Postvault.
//!
//! This crate provides shared functionality used across all Postvault crates:
//!
//! - **Configuration**: Loading, validation, and persistence of the JSON5 config file
//! - **Secrets**: [`SecretString`], a zero-on-drop string that never prints its value
//! - **Utilities**: Path resolution and environment handling

pub mod config;
pub mod env;
pub mod error;
pub mod paths;
pub mod secret;

// Re-exports for convenience
pub use config::Config;
pub use error::{ConfigError, Error, Result};
pub use secret::SecretString;
