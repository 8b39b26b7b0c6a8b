//! `postvault publish`: decrypt stored credentials and post.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use postvault_channels::{MediaFile, Post, PublisherFactory};

use super::{load_config, open_service};

/// Publish command arguments.
#[derive(Args)]
pub struct PublishArgs {
    /// Credential id to publish with
    pub id: String,

    /// Post text
    #[arg(long)]
    pub text: String,

    /// Attach a media file (repeatable)
    #[arg(long)]
    pub media: Vec<PathBuf>,

    /// Discord channel id, overriding the stored default
    #[arg(long)]
    pub channel: Option<String>,

    /// Print the receipt as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the publish command.
pub async fn run(args: PublishArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let service = open_service(&config)?;

    let mut post = Post::text(args.text);
    for path in &args.media {
        let media = MediaFile::from_path(path)
            .await
            .with_context(|| format!("Failed to read media file {}", path.display()))?;
        post = post.with_media(media);
    }

    let credential = service
        .load(&args.id)
        .await
        .with_context(|| format!("Failed to load credentials '{}'", args.id))?;
    let publisher = PublisherFactory::new(config).build(credential, args.channel)?;

    let receipt = publisher
        .publish(&post)
        .await
        .with_context(|| format!("Failed to publish to {}", publisher.platform()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&receipt)?);
    } else {
        match &receipt.url {
            Some(url) => println!("Published {} post {} ({}).", receipt.platform, receipt.id, url),
            None => println!("Published {} post {}.", receipt.platform, receipt.id),
        }
    }

    Ok(())
}
