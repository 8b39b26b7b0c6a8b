//! Postvault command-line interface.

pub mod commands;

use clap::{Parser, Subcommand};

/// Postvault - encrypted social credentials and publishing
#[derive(Parser)]
#[command(name = "postvault")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to config file
    #[arg(short, long, env = "POSTVAULT_CONFIG")]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Generate or check the encryption key
    Key(commands::key::KeyArgs),

    /// Manage encrypted platform credentials
    Credentials(commands::credentials::CredentialsArgs),

    /// Publish a post with stored credentials
    Publish(commands::publish::PublishArgs),

    /// Show version information
    Version,
}

/// Run the CLI with the given arguments.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Key(args) => commands::key::run(args, config_path).await,
        Commands::Credentials(args) => commands::credentials::run(args, config_path).await,
        Commands::Publish(args) => commands::publish::run(args, config_path).await,
        Commands::Version => {
            println!("postvault {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
