//! Credential management commands.
//!
//! Provides `postvault credentials add|list|delete|rotate|migrate`. Secret
//! values not given as flags are read with a hidden prompt.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use clap::Args;
use postvault_secrets::types::DISCORD_CHANNEL_ID;
use postvault_secrets::{
    CredentialService, CredentialSummary, DiscordCredentials, PlatformCredentials,
    TwitterCredentials,
};

use super::{load_config, open_service, read_secret};

/// Credentials command arguments.
#[derive(Args)]
pub struct CredentialsArgs {
    #[command(subcommand)]
    pub command: CredentialsCommand,
}

#[derive(clap::Subcommand)]
pub enum CredentialsCommand {
    /// Encrypt and store credentials for an account
    Add {
        #[command(subcommand)]
        platform: AddCommand,
    },

    /// List stored credentials (no secrets)
    List {
        /// Only show credentials owned by this user
        #[arg(long)]
        owner: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Delete stored credentials
    Delete {
        /// Credential id
        id: String,
    },

    /// Replace the secrets of stored credentials (prompts for each value)
    Rotate {
        /// Credential id
        id: String,
    },

    /// Re-encrypt legacy tokens with the current format
    Migrate,
}

#[derive(clap::Subcommand)]
pub enum AddCommand {
    /// Twitter/X OAuth 1.0a user credentials
    Twitter {
        /// Owning user id
        #[arg(long)]
        owner: String,

        /// Display label
        #[arg(long)]
        label: Option<String>,

        #[arg(long)]
        consumer_key: Option<String>,

        #[arg(long)]
        consumer_secret: Option<String>,

        #[arg(long)]
        access_token: Option<String>,

        #[arg(long)]
        access_token_secret: Option<String>,
    },

    /// Discord bot credentials
    Discord {
        /// Owning user id
        #[arg(long)]
        owner: String,

        /// Display label
        #[arg(long)]
        label: Option<String>,

        /// Default channel to post to
        #[arg(long)]
        channel: Option<String>,

        #[arg(long)]
        bot_token: Option<String>,
    },
}

/// Run the credentials command.
pub async fn run(args: CredentialsArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let service = open_service(&config)?;

    match args.command {
        CredentialsCommand::Add { platform } => add(&service, platform).await?,

        CredentialsCommand::List { owner, json } => {
            let summaries = match owner {
                Some(owner) => service.list_for_owner(&owner).await?,
                None => service.list_all().await?,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                print_table(&summaries);
            }
        }

        CredentialsCommand::Delete { id } => {
            service.remove(&id).await?;
            println!("Credentials '{}' deleted.", id);
        }

        CredentialsCommand::Rotate { id } => {
            let summary = service.summary(&id).await?;
            let mut fields = BTreeMap::new();
            for field in summary.platform.secret_fields() {
                fields.insert(field.to_string(), read_secret(field, None)?);
            }
            let credentials = PlatformCredentials::from_fields(summary.platform, fields)?;

            service.rotate(&id, &credentials).await?;
            println!("Credentials '{}' rotated.", id);
        }

        CredentialsCommand::Migrate => {
            let report = service
                .migrate_legacy()
                .await
                .context("Migration aborted")?;

            println!(
                "Scanned {} record(s); upgraded {} token(s) in {} record(s).",
                report.records_scanned, report.tokens_upgraded, report.records_updated
            );
            if !report.failed.is_empty() {
                for id in &report.failed {
                    eprintln!("  could not migrate {id}");
                }
                anyhow::bail!(
                    "{} record(s) hold tokens that cannot be decrypted",
                    report.failed.len()
                );
            }
        }
    }

    Ok(())
}

async fn add(service: &CredentialService, command: AddCommand) -> anyhow::Result<()> {
    let (owner, label, credentials, metadata) = match command {
        AddCommand::Twitter {
            owner,
            label,
            consumer_key,
            consumer_secret,
            access_token,
            access_token_secret,
        } => {
            let credentials = PlatformCredentials::Twitter(TwitterCredentials {
                consumer_key: read_secret("consumer_key", consumer_key)?,
                consumer_secret: read_secret("consumer_secret", consumer_secret)?,
                access_token: read_secret("access_token", access_token)?,
                access_token_secret: read_secret("access_token_secret", access_token_secret)?,
            });
            (owner, label, credentials, BTreeMap::new())
        }

        AddCommand::Discord {
            owner,
            label,
            channel,
            bot_token,
        } => {
            let credentials = PlatformCredentials::Discord(DiscordCredentials {
                bot_token: read_secret("bot_token", bot_token)?,
            });
            let metadata = channel
                .map(|c| BTreeMap::from([(DISCORD_CHANNEL_ID.to_string(), c)]))
                .unwrap_or_default();
            (owner, label, credentials, metadata)
        }
    };

    let summary = service
        .register(&owner, &credentials, label, metadata)
        .await?;
    println!(
        "Stored {} credentials for '{}' as {}.",
        summary.platform, summary.owner_id, summary.id
    );
    Ok(())
}

fn print_table(summaries: &[CredentialSummary]) {
    if summaries.is_empty() {
        println!("No credentials stored.");
        return;
    }

    println!(
        "{:<36}  {:<8}  {:<20}  {:<16}  {}",
        "ID", "PLATFORM", "OWNER", "LABEL", "UPDATED"
    );
    println!("{}", "-".repeat(110));
    for s in summaries {
        println!(
            "{:<36}  {:<8}  {:<20}  {:<16}  {}",
            s.id,
            s.platform.as_str(),
            s.owner_id,
            s.label.as_deref().unwrap_or("-"),
            s.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    println!("\n{} credential(s) total.", summaries.len());
}
