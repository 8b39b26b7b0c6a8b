//! Platform publishers for Postvault.
//!
//! A [`Publisher`] posts content to one platform account. Publishers are
//! built from freshly decrypted credentials (see [`PublisherFactory`]) and
//! dropped as soon as the post is done; plaintext secrets never outlive the
//! request.
//!
//! - [`TwitterPublisher`]: tweets with optional media, OAuth 1.0a signed
//! - [`DiscordPublisher`]: channel messages with optional attachments

pub mod discord;
pub mod error;
pub mod oauth;
pub mod registry;
pub mod traits;
pub mod twitter;

pub use discord::DiscordPublisher;
pub use error::{ChannelError, Result};
pub use registry::PublisherFactory;
pub use traits::{MediaFile, Post, PublishReceipt, Publisher};
pub use twitter::TwitterPublisher;
