//! Encryption key commands.
//!
//! `postvault key generate` prints a fresh key to put in the environment;
//! `postvault key check` verifies the configured key before anything is
//! encrypted with it.

use std::path::Path;

use anyhow::Context;
use clap::Args;
use postvault_secrets::{CredentialCipher, EncryptionKey};

use super::load_config;

/// Key command arguments.
#[derive(Args)]
pub struct KeyArgs {
    #[command(subcommand)]
    pub command: KeyCommand,
}

#[derive(clap::Subcommand)]
pub enum KeyCommand {
    /// Print a new random key as 64 hex characters
    Generate,

    /// Validate the key in the configured environment variable
    Check,
}

/// Run the key command.
pub async fn run(args: KeyArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    match args.command {
        KeyCommand::Generate => {
            let key = EncryptionKey::generate();
            println!("{}", key.to_hex());
            eprintln!("Store this value in the environment variable named by secrets.key_env.");
        }

        KeyCommand::Check => {
            let config = load_config(config_path)?;
            let key_env = &config.secrets.key_env;
            let cipher = CredentialCipher::from_env(key_env)
                .with_context(|| format!("{key_env} does not hold a usable key"))?;

            let probe = "postvault-key-check";
            let token = cipher.encrypt(probe)?;
            if cipher.decrypt(&token)?.expose() != probe {
                anyhow::bail!("Key self-test failed");
            }
            println!("Key in {key_env} is valid.");
        }
    }

    Ok(())
}
