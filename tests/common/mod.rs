//! Shared test utilities and fixtures
//!
//! A [`Harness`] wires the real controller, Gemini client, channel sink and
//! gate to an [`App`], pointed at a wiremock server.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use parley_config::{CredentialStore, MemoryCredentialStore};
use parley_engine::{App, AppOptions, ChannelSink, SharedGate, TurnController, TurnReport};
use parley_providers::GeminiClient;
use parley_types::Role;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const MODEL: &str = "gemini-2.0-flash";
pub const API_KEY: &str = "AIza-integration-key";

pub fn method_path() -> String {
    format!("/models/{MODEL}:generateContent")
}

/// Success body with a single text part.
pub fn reply_body(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

pub fn error_body(code: u16, message: &str) -> Value {
    json!({ "error": { "code": code, "message": message, "status": "RESOURCE_EXHAUSTED" } })
}

pub async fn mount_json(server: &MockServer, status: u16, body: Value) {
    Mock::given(method("POST"))
        .and(path(method_path()))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

pub type Controller = TurnController<GeminiClient, ChannelSink, SharedGate>;

pub struct Harness {
    pub app: App,
    pub controller: Controller,
    pub credentials: Arc<dyn CredentialStore>,
}

impl Harness {
    pub fn new(base_url: &str, credentials: Arc<dyn CredentialStore>) -> Self {
        let client = GeminiClient::new(base_url, MODEL).unwrap();
        let app = App::new(
            Arc::clone(&credentials),
            AppOptions {
                ascii_only: false,
                model: MODEL.to_string(),
            },
        );
        let controller = TurnController::new(
            client,
            Arc::clone(&credentials),
            app.sink(),
            app.gate(),
        );
        Self {
            app,
            controller,
            credentials,
        }
    }

    pub fn with_key(server: &MockServer) -> Self {
        Self::new(
            &server.uri(),
            Arc::new(MemoryCredentialStore::with_credential(API_KEY)),
        )
    }

    pub fn without_key(server: &MockServer) -> Self {
        Self::new(&server.uri(), Arc::new(MemoryCredentialStore::new()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.controller = self.controller.with_timeout(timeout);
        self
    }

    /// Type `text` and press Enter, then run whatever the entry queued.
    pub async fn type_and_send(&mut self, text: &str) -> Vec<Option<TurnReport>> {
        for c in text.chars() {
            self.app.insert_char(c);
        }
        self.app.submit();
        let mut reports = Vec::new();
        for queued in self.app.take_submissions() {
            reports.push(self.controller.submit(&queued).await);
        }
        self.app.process_view_events();
        reports
    }

    /// Submit directly to the controller and apply the resulting view events.
    pub async fn submit(&mut self, text: &str) -> Option<TurnReport> {
        let report = self.controller.submit(text).await;
        self.app.process_view_events();
        report
    }

    pub fn transcript(&self) -> Vec<(Role, String)> {
        self.app
            .transcript()
            .entries()
            .iter()
            .map(|entry| (entry.role(), entry.text().to_string()))
            .collect()
    }

    pub fn assistant_messages(&self) -> Vec<String> {
        self.transcript()
            .into_iter()
            .filter(|(role, _)| *role == Role::Assistant)
            .map(|(_, text)| text)
            .collect()
    }

    /// Gate open, no placeholder left behind.
    pub fn assert_settled(&self) {
        assert!(!self.app.is_locked(), "input gate still locked");
        assert!(
            !self.app.transcript().has_placeholder(),
            "placeholder still attached"
        );
    }
}

pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map_or(0, |requests| requests.len())
}
