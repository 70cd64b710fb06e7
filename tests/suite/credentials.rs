//! Credential entry through the app, persisted to disk.

use std::sync::Arc;

use parley_config::{CredentialStore, FileCredentialStore};
use parley_engine::{InputMode, MISSING_CREDENTIAL_MESSAGE, TurnError};
use wiremock::MockServer;

use crate::common::{Harness, mount_json, reply_body, request_count};

fn file_store(dir: &tempfile::TempDir) -> Arc<dyn CredentialStore> {
    Arc::new(FileCredentialStore::new(dir.path().join("credentials.toml")))
}

fn type_line(harness: &mut Harness, line: &str) {
    for c in line.chars() {
        harness.app.insert_char(c);
    }
    harness.app.submit();
}

#[tokio::test]
async fn key_entered_in_app_survives_restart() {
    let server = MockServer::start().await;
    mount_json(&server, 200, reply_body("Hi there")).await;
    let dir = tempfile::tempdir().unwrap();

    let mut harness = Harness::new(&server.uri(), file_store(&dir));
    type_line(&mut harness, "/key");
    assert_eq!(harness.app.mode(), InputMode::CredentialEntry);
    type_line(&mut harness, "AIza-saved-key");
    assert_eq!(harness.app.mode(), InputMode::Insert);
    assert_eq!(harness.app.notice().unwrap().text, "API key saved");
    assert!(harness.transcript().is_empty());
    drop(harness);

    let mut restarted = Harness::new(&server.uri(), file_store(&dir));
    assert!(restarted.credentials.is_configured());
    let report = restarted.submit("Hello").await.unwrap();
    assert!(report.error.is_none());
    assert_eq!(restarted.assistant_messages(), vec!["Hi there"]);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(
        requests[0]
            .url
            .query_pairs()
            .any(|(name, value)| name == "key" && value == "AIza-saved-key")
    );
}

#[tokio::test]
async fn forget_removes_the_key_for_the_next_turn() {
    let server = MockServer::start().await;
    mount_json(&server, 200, reply_body("Hi there")).await;
    let dir = tempfile::tempdir().unwrap();
    file_store(&dir).set("AIza-to-forget").unwrap();

    let mut harness = Harness::new(&server.uri(), file_store(&dir));
    type_line(&mut harness, "/forget");
    assert_eq!(harness.app.notice().unwrap().text, "API key removed");

    let report = harness.submit("Hello").await.unwrap();
    assert_eq!(report.error, Some(TurnError::MissingCredential));
    assert_eq!(harness.assistant_messages(), vec![MISSING_CREDENTIAL_MESSAGE]);
    assert_eq!(request_count(&server).await, 0);
    assert!(!file_store(&dir).is_configured());
}

#[tokio::test]
async fn escape_leaves_the_prompt_without_saving() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let mut harness = Harness::new(&server.uri(), file_store(&dir));
    type_line(&mut harness, "/key");
    for c in "AIza-abandoned".chars() {
        harness.app.insert_char(c);
    }
    harness.app.cancel();

    assert_eq!(harness.app.mode(), InputMode::Insert);
    assert!(!harness.app.should_quit());
    assert!(!file_store(&dir).is_configured());
}
