//! End-to-end turns against a mock Gemini endpoint.

use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;

use parley_engine::{EMPTY_REPLY_MESSAGE, MISSING_CREDENTIAL_MESSAGE, TurnError, TurnOutcome};
use parley_types::Role;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{
    API_KEY, Harness, error_body, method_path, mount_json, reply_body, request_count,
};

#[tokio::test]
async fn hello_gets_a_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(method_path()))
        .and(query_param("key", API_KEY))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "Hello" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("Hi there")))
        .expect(1)
        .mount(&server)
        .await;

    let mut harness = Harness::with_key(&server);
    let reports = harness.type_and_send("  Hello  ").await;

    let report = reports[0].as_ref().unwrap();
    assert_eq!(report.outcome, TurnOutcome::Succeeded);
    assert!(report.error.is_none());
    assert!(!report.degraded);
    assert_eq!(
        harness.transcript(),
        vec![
            (Role::User, "Hello".to_string()),
            (Role::Assistant, "Hi there".to_string()),
        ]
    );
    assert!(harness.app.draft().is_empty());
    harness.assert_settled();
}

#[tokio::test]
async fn api_error_message_is_shown() {
    let server = MockServer::start().await;
    mount_json(&server, 429, error_body(429, "quota exceeded")).await;

    let mut harness = Harness::with_key(&server);
    let report = harness.submit("Hello").await.unwrap();

    assert_eq!(report.outcome, TurnOutcome::Failed);
    assert_eq!(
        report.error,
        Some(TurnError::ApiError {
            status: 429,
            message: Some("quota exceeded".to_string()),
        })
    );
    let replies = harness.assistant_messages();
    assert_eq!(replies.len(), 1);
    assert!(replies[0].contains("quota exceeded"));
    harness.assert_settled();
}

#[tokio::test]
async fn non_json_body_is_an_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(method_path()))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let mut harness = Harness::with_key(&server);
    let report = harness.submit("Hello").await.unwrap();

    assert_eq!(report.error, Some(TurnError::InvalidResponse { status: 502 }));
    assert_eq!(
        harness.assistant_messages(),
        vec![TurnError::InvalidResponse { status: 502 }.user_message()]
    );
    harness.assert_settled();
}

#[tokio::test]
async fn empty_candidates_show_the_fallback() {
    let server = MockServer::start().await;
    mount_json(&server, 200, json!({ "candidates": [] })).await;

    let mut harness = Harness::with_key(&server);
    let report = harness.submit("Hello").await.unwrap();

    assert_eq!(report.outcome, TurnOutcome::Succeeded);
    assert!(report.degraded);
    assert_eq!(harness.assistant_messages(), vec![EMPTY_REPLY_MESSAGE]);
    harness.assert_settled();
}

#[tokio::test]
async fn missing_credential_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let mut harness = Harness::without_key(&server);
    let report = harness.submit("Hello").await.unwrap();

    assert_eq!(report.error, Some(TurnError::MissingCredential));
    assert_eq!(
        harness.transcript(),
        vec![
            (Role::User, "Hello".to_string()),
            (Role::Assistant, MISSING_CREDENTIAL_MESSAGE.to_string()),
        ]
    );
    assert_eq!(request_count(&server).await, 0);
    harness.assert_settled();
}

#[tokio::test]
async fn slow_reply_times_out_and_unlocks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(method_path()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(reply_body("too late"))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let mut harness = Harness::with_key(&server).with_timeout(Duration::from_millis(300));
    let report = harness.submit("Hello").await.unwrap();

    assert_eq!(report.outcome, TurnOutcome::TimedOut);
    assert!(matches!(report.error, Some(TurnError::Timeout { .. })));
    assert!(report.elapsed < Duration::from_secs(5));
    let replies = harness.assistant_messages();
    assert_eq!(replies.len(), 1);
    assert!(!replies[0].contains("too late"));
    harness.assert_settled();
}

#[tokio::test]
async fn unreachable_host_is_a_network_failure() {
    // Nothing listens on port 1.
    let mut harness = Harness::new(
        "http://127.0.0.1:1",
        std::sync::Arc::new(parley_config::MemoryCredentialStore::with_credential(API_KEY)),
    );
    let report = harness.submit("Hello").await.unwrap();

    match report.error {
        Some(TurnError::NetworkOrApiFailure { ref detail }) => {
            assert!(!detail.contains(API_KEY), "credential leaked: {detail}");
        }
        ref other => panic!("expected network failure, got {other:?}"),
    }
    assert_eq!(report.outcome, TurnOutcome::Failed);
    harness.assert_settled();
}

#[tokio::test]
async fn blank_entry_is_ignored() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let mut harness = Harness::with_key(&server);
    let reports = harness.type_and_send("   ").await;

    assert!(reports.iter().all(Option::is_none));
    assert!(harness.transcript().is_empty());
    assert!(!harness.app.is_locked());
}

#[tokio::test]
async fn consecutive_turns_keep_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(method_path()))
        .and(body_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "first" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("one")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(method_path()))
        .and(body_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "second" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("two")))
        .mount(&server)
        .await;

    let mut harness = Harness::with_key(&server);
    let first = harness.type_and_send("first").await;
    let second = harness.type_and_send("second").await;

    let first_id = first[0].as_ref().unwrap().id;
    let second_id = second[0].as_ref().unwrap().id;
    assert!(second_id > first_id);
    assert_eq!(
        harness.transcript(),
        vec![
            (Role::User, "first".to_string()),
            (Role::Assistant, "one".to_string()),
            (Role::User, "second".to_string()),
            (Role::Assistant, "two".to_string()),
        ]
    );
    assert_eq!(request_count(&server).await, 2);
    harness.assert_settled();
}

#[tokio::test]
async fn second_submission_during_a_turn_is_dropped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(method_path()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(reply_body("Hi there"))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut harness = Harness::with_key(&server);
    let (first, second) = tokio::join!(
        harness.controller.submit("Hello"),
        harness.controller.submit("Hello again"),
    );
    harness.app.process_view_events();

    assert!(first.is_some());
    assert!(second.is_none());
    assert_eq!(
        harness.transcript(),
        vec![
            (Role::User, "Hello".to_string()),
            (Role::Assistant, "Hi there".to_string()),
        ]
    );
    harness.assert_settled();
}

#[tokio::test]
async fn double_enter_without_key_runs_one_turn() {
    let server = MockServer::start().await;
    let mut harness = Harness::without_key(&server);
    for c in "Hello".chars() {
        harness.app.insert_char(c);
    }
    harness.app.submit();
    harness.app.submit();

    let queued = harness.app.take_submissions();
    let controller = &harness.controller;
    let mut turns: FuturesUnordered<_> = queued
        .iter()
        .map(|text| async move { controller.submit(text).await })
        .collect();
    let mut started = 0;
    while let Some(report) = turns.next().await {
        started += usize::from(report.is_some());
    }
    drop(turns);

    // Enter again on the frame after the turn, before its events are applied.
    harness.app.submit();
    assert!(harness.app.take_submissions().is_empty());
    harness.app.process_view_events();

    assert_eq!(queued.len(), 1);
    assert_eq!(started, 1);
    assert_eq!(
        harness.transcript(),
        vec![
            (Role::User, "Hello".to_string()),
            (Role::Assistant, MISSING_CREDENTIAL_MESSAGE.to_string()),
        ]
    );
    assert_eq!(request_count(&server).await, 0);
    harness.assert_settled();
}
