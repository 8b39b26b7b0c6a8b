//! Builds publishers from decrypted credentials and configuration.

use postvault_core::Config;
use postvault_secrets::types::DISCORD_CHANNEL_ID;
use postvault_secrets::{LoadedCredential, PlatformCredentials};
use tracing::debug;

use crate::discord::DiscordPublisher;
use crate::traits::Publisher;
use crate::twitter::TwitterPublisher;
use crate::{ChannelError, Result};

/// Turns a [`LoadedCredential`] into the matching [`Publisher`].
#[derive(Debug, Clone)]
pub struct PublisherFactory {
    config: Config,
}

impl PublisherFactory {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Build a publisher for `credential`.
    ///
    /// For Discord, `channel_override` wins over the record's `channel_id`
    /// metadata. It is ignored for Twitter.
    pub fn build(
        &self,
        credential: LoadedCredential,
        channel_override: Option<String>,
    ) -> Result<Box<dyn Publisher>> {
        let timeout = self.config.http.timeout_secs;
        let id = credential.summary.id;

        match credential.credentials {
            PlatformCredentials::Twitter(creds) => {
                debug!(credential_id = %id, "building twitter publisher");
                let publisher = TwitterPublisher::with_timeout(creds, timeout)?
                    .with_api_base(&self.config.twitter.api_base)
                    .with_upload_base(&self.config.twitter.upload_base);
                Ok(Box::new(publisher))
            }
            PlatformCredentials::Discord(creds) => {
                let channel_id = channel_override
                    .or_else(|| credential.metadata.get(DISCORD_CHANNEL_ID).cloned())
                    .ok_or_else(|| {
                        ChannelError::InvalidTarget(format!(
                            "no Discord channel for credential {id}; pass one or store '{DISCORD_CHANNEL_ID}' metadata"
                        ))
                    })?;
                debug!(credential_id = %id, channel_id = %channel_id, "building discord publisher");
                let publisher = DiscordPublisher::with_timeout(creds, channel_id, timeout)?
                    .with_api_base(&self.config.discord.api_base);
                Ok(Box::new(publisher))
            }
        }
    }
}
