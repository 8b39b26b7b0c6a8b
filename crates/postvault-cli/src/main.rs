//! Postvault CLI entry point.

use clap::Parser;
use postvault_cli::{commands, run, Cli};
use postvault_core::config::LoggingConfig;
use postvault_core::env::{self, vars};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env::load_dotenv()?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Logging settings come from the config file when it can be read; any
    // config error is reported again by the command that needs it.
    let logging = commands::load_config(cli.config.as_deref())
        .map(|c| c.logging)
        .unwrap_or_default();
    init_logging(cli.verbose, &logging);

    // Run the command
    run(cli).await
}

fn init_logging(verbose: u8, logging: &LoggingConfig) {
    let default = match verbose {
        0 => logging
            .level
            .clone()
            .unwrap_or_else(|| "postvault=info".to_string()),
        1 => "postvault=debug".to_string(),
        _ => "postvault=trace".to_string(),
    };

    let filter = EnvFilter::try_from_env(vars::POSTVAULT_LOG)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default));

    // Logs go to stderr so command output on stdout stays machine-readable.
    let (json, text) = if logging.json {
        (Some(fmt::layer().json().with_writer(std::io::stderr)), None)
    } else {
        (None, Some(fmt::layer().with_writer(std::io::stderr)))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .init();
}
