//! End-to-end credential storage tests over the file store.
//!
//! Each test drops its service and opens a new one on the same directory to
//! check that records survive a process restart.

use std::collections::BTreeMap;
use std::sync::Arc;

use postvault_channels::{Post, PublisherFactory};
use postvault_core::{Config, SecretString};
use postvault_secrets::types::{discord_fields, twitter_fields, DISCORD_CHANNEL_ID};
use postvault_secrets::{
    CredentialCipher, CredentialRecord, CredentialService, CredentialStore, DiscordCredentials,
    EncryptionKey, FileCredentialStore, Platform, PlatformCredentials, SecretError, TokenVersion,
    TwitterCredentials,
};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn open(dir: &TempDir, key_hex: &str) -> CredentialService {
    let cipher = CredentialCipher::new(EncryptionKey::parse(key_hex).unwrap());
    let store = FileCredentialStore::new(dir.path());
    CredentialService::new(Arc::new(cipher), Arc::new(store))
}

fn twitter() -> PlatformCredentials {
    PlatformCredentials::Twitter(TwitterCredentials {
        consumer_key: SecretString::new("integration-consumer-key"),
        consumer_secret: SecretString::new("integration-consumer-secret"),
        access_token: SecretString::new("42-integration-access-token"),
        access_token_secret: SecretString::new("integration-access-secret"),
    })
}

#[tokio::test]
async fn test_register_reload_after_restart() {
    let dir = TempDir::new().unwrap();
    let key = EncryptionKey::generate().to_hex();

    let id = open(&dir, &key)
        .register("user-1", &twitter(), Some("brand".into()), BTreeMap::new())
        .await
        .unwrap()
        .id;

    let loaded = open(&dir, &key).load(&id).await.unwrap();
    assert_eq!(loaded.summary.owner_id, "user-1");
    match loaded.credentials {
        PlatformCredentials::Twitter(c) => {
            assert_eq!(c.consumer_key.expose_secret(), "integration-consumer-key");
            assert_eq!(c.access_token.expose_secret(), "42-integration-access-token");
        }
        _ => panic!("expected twitter credentials"),
    }
}

#[tokio::test]
async fn test_files_hold_no_plaintext() {
    let dir = TempDir::new().unwrap();
    let key = EncryptionKey::generate().to_hex();
    let id = open(&dir, &key)
        .register("user-1", &twitter(), None, BTreeMap::new())
        .await
        .unwrap()
        .id;

    let raw = std::fs::read_to_string(dir.path().join(format!("{id}.json"))).unwrap();
    assert!(!raw.contains("integration-"));
    assert!(!raw.contains(&key));

    let record: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let token = record["secrets"][twitter_fields::CONSUMER_KEY].as_str().unwrap();
    assert!(token.starts_with("v2:"));
}

#[tokio::test]
async fn test_wrong_key_reports_corrupt_record() {
    let dir = TempDir::new().unwrap();
    let id = open(&dir, &EncryptionKey::generate().to_hex())
        .register("user-1", &twitter(), None, BTreeMap::new())
        .await
        .unwrap()
        .id;

    let err = open(&dir, &EncryptionKey::generate().to_hex())
        .load(&id)
        .await
        .unwrap_err();
    assert!(matches!(err, SecretError::Corrupt { .. }));
    assert!(err.is_corrupt_data());
}

#[tokio::test]
async fn test_migrate_legacy_records_on_disk() {
    let dir = TempDir::new().unwrap();
    let key = EncryptionKey::generate().to_hex();

    // A record written by a reader that only knows the legacy format.
    let legacy_cipher = CredentialCipher::new(EncryptionKey::parse(&key).unwrap());
    let mut record = CredentialRecord::new("user-2", Platform::Discord);
    record.secrets.insert(
        discord_fields::BOT_TOKEN.to_string(),
        legacy_cipher
            .encrypt_with(TokenVersion::LegacyCbc, "legacy-bot-token")
            .unwrap(),
    );
    let id = record.id.clone();
    FileCredentialStore::new(dir.path()).insert(record).await.unwrap();

    let report = open(&dir, &key).migrate_legacy().await.unwrap();
    assert_eq!(report.records_scanned, 1);
    assert_eq!(report.tokens_upgraded, 1);
    assert!(report.failed.is_empty());

    let stored = FileCredentialStore::new(dir.path()).get(&id).await.unwrap();
    assert!(stored.secrets[discord_fields::BOT_TOKEN].starts_with("v2:"));

    match open(&dir, &key).load(&id).await.unwrap().credentials {
        PlatformCredentials::Discord(DiscordCredentials { bot_token }) => {
            assert_eq!(bot_token.expose_secret(), "legacy-bot-token")
        }
        _ => panic!("expected discord credentials"),
    }

    // Nothing left to upgrade.
    let again = open(&dir, &key).migrate_legacy().await.unwrap();
    assert_eq!(again.tokens_upgraded, 0);
}

#[tokio::test]
async fn test_stored_discord_credential_publishes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v10/channels/8080/messages"))
        .and(header("authorization", "Bot stored-bot-token"))
        .and(body_json(json!({ "content": "from the vault" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "77", "channel_id": "8080" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let key = EncryptionKey::generate().to_hex();
    let credentials = PlatformCredentials::Discord(DiscordCredentials {
        bot_token: SecretString::new("stored-bot-token"),
    });
    let metadata = BTreeMap::from([(DISCORD_CHANNEL_ID.to_string(), "8080".to_string())]);
    let id = open(&dir, &key)
        .register("user-3", &credentials, None, metadata)
        .await
        .unwrap()
        .id;

    let mut config = Config::default();
    config.discord.api_base = server.uri();
    let loaded = open(&dir, &key).load(&id).await.unwrap();
    let publisher = PublisherFactory::new(config).build(loaded, None).unwrap();

    let receipt = publisher.publish(&Post::text("from the vault")).await.unwrap();
    assert_eq!(receipt.platform, Platform::Discord);
    assert_eq!(receipt.id, "77");
}
