//! CLI routing integration tests.
//!
//! Commands are parsed with `Cli::try_parse_from` and executed in-process
//! against a temp config and credential directory.

use clap::Parser;
use postvault_cli::{run, Cli};
use postvault_integration_tests::Workspace;
use postvault_secrets::types::DISCORD_CHANNEL_ID;
use postvault_secrets::{Platform, PlatformCredentials};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn postvault(argv: Vec<&str>) -> anyhow::Result<()> {
    run(Cli::try_parse_from(argv)?).await
}

#[tokio::test]
async fn test_version() {
    postvault(vec!["postvault", "version"]).await.unwrap();
}

#[test]
fn test_unknown_command_rejected() {
    assert!(Cli::try_parse_from(["postvault", "frobnicate"]).is_err());
}

#[tokio::test]
async fn test_key_generate_needs_no_config() {
    postvault(vec!["postvault", "--config", "/nonexistent/postvault.json5", "key", "generate"])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_key_check() {
    let ws = Workspace::new("POSTVAULT_IT_KEY_CHECK");
    postvault(ws.argv(&["key", "check"])).await.unwrap();

    std::env::set_var(&ws.key_env, "too-short");
    let err = postvault(ws.argv(&["key", "check"])).await.unwrap_err();
    assert!(err.to_string().contains("POSTVAULT_IT_KEY_CHECK"));
}

#[tokio::test]
async fn test_commands_refuse_to_run_without_key() {
    let ws = Workspace::new("POSTVAULT_IT_NO_KEY");
    std::env::remove_var(&ws.key_env);

    assert!(postvault(ws.argv(&["credentials", "list"])).await.is_err());
    assert!(!ws.store_dir().exists());
}

#[tokio::test]
async fn test_add_discord_then_list_and_delete() {
    let ws = Workspace::new("POSTVAULT_IT_ADD_DISCORD");
    postvault(ws.argv(&[
        "credentials",
        "add",
        "discord",
        "--owner",
        "alice",
        "--label",
        "community",
        "--channel",
        "1234",
        "--bot-token",
        "discord-bot-token",
    ]))
    .await
    .unwrap();

    let service = ws.service();
    let summaries = service.list_for_owner("alice").await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].platform, Platform::Discord);

    let loaded = service.load(&summaries[0].id).await.unwrap();
    assert_eq!(loaded.metadata.get(DISCORD_CHANNEL_ID).map(String::as_str), Some("1234"));
    match loaded.credentials {
        PlatformCredentials::Discord(c) => {
            assert_eq!(c.bot_token.expose_secret(), "discord-bot-token")
        }
        _ => panic!("expected discord credentials"),
    }

    postvault(ws.argv(&["credentials", "list", "--owner", "alice", "--json"]))
        .await
        .unwrap();

    let id = summaries[0].id.clone();
    postvault(ws.argv(&["credentials", "delete", &id])).await.unwrap();
    assert!(service.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_add_twitter_with_flags() {
    let ws = Workspace::new("POSTVAULT_IT_ADD_TWITTER");
    postvault(ws.argv(&[
        "credentials",
        "add",
        "twitter",
        "--owner",
        "bob",
        "--consumer-key",
        "ck",
        "--consumer-secret",
        "cs",
        "--access-token",
        "at",
        "--access-token-secret",
        "ats",
    ]))
    .await
    .unwrap();

    let summaries = ws.service().list_all().await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].owner_id, "bob");
}

#[tokio::test]
async fn test_migrate_empty_store() {
    let ws = Workspace::new("POSTVAULT_IT_MIGRATE_EMPTY");
    postvault(ws.argv(&["credentials", "migrate"])).await.unwrap();
}

#[tokio::test]
async fn test_publish_unknown_id() {
    let ws = Workspace::new("POSTVAULT_IT_PUBLISH_UNKNOWN");
    let err = postvault(ws.argv(&["publish", "does-not-exist", "--text", "hi"]))
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("does-not-exist"));
}

#[tokio::test]
async fn test_publish_to_discord() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v10/channels/555/messages"))
        .and(header("authorization", "Bot publish-token"))
        .and(body_json(json!({ "content": "release notes" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "9001", "channel_id": "555" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let ws = Workspace::with_config("POSTVAULT_IT_PUBLISH_DISCORD", |config| {
        config.discord.api_base = uri;
    });
    postvault(ws.argv(&[
        "credentials",
        "add",
        "discord",
        "--owner",
        "carol",
        "--channel",
        "111",
        "--bot-token",
        "publish-token",
    ]))
    .await
    .unwrap();

    let id = ws.service().list_all().await.unwrap()[0].id.clone();
    postvault(ws.argv(&[
        "publish",
        &id,
        "--text",
        "release notes",
        "--channel",
        "555",
    ]))
    .await
    .unwrap();
}
