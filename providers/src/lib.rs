//! Gemini API client for single-turn requests.
//!
//! # Architecture
//!
//! - [`Transport`] - the network boundary the turn controller talks to
//! - [`gemini`] - `generateContent` wire format and the [`GeminiClient`] transport
//!
//! A transport performs exactly one HTTP exchange and reports the raw status and
//! body. It does not interpret either: classifying a reply (invalid JSON, API
//! error, empty candidate list) is the controller's job.
//!
//! # Cancellation
//!
//! Every call takes a [`CancellationToken`]. Cancelling it drops the in-flight
//! request and the call resolves to [`TransportError::Aborted`]. The transport has
//! no deadline of its own beyond the connect timeout.

pub mod gemini;

pub use gemini::{GeminiClient, error_message, extract_reply, parse_response_body};
pub use tokio_util::sync::CancellationToken;

use parley_types::Credential;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

const CONNECT_TIMEOUT_SECS: u64 = 30;
const TCP_KEEPALIVE_SECS: u64 = 60;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

/// Status and body of one completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    /// The cancellation token fired before the exchange completed.
    #[error("request aborted")]
    Aborted,
    /// Never carries the request URL, which holds the credential.
    #[error("request failed: {0}")]
    Request(reqwest::Error),
    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        Self::Request(e.without_url())
    }
}

/// One outbound request carrying a single user turn.
pub trait Transport {
    fn send(
        &self,
        credential: &Credential,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<HttpReply, TransportError>>;
}

/// Shared client settings: bounded connect, keepalive, no redirects.
pub(crate) fn client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .user_agent(concat!("parley/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::none())
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
}
