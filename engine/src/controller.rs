//! Request lifecycle controller.
//!
//! [`TurnController::submit`] drives one user submission from the locked gate
//! to the final assistant message. The only suspension point is the transport
//! await; the gate is checked and locked before it, so a second submission
//! arriving mid-turn is a no-op.
//!
//! Every path, including the missing-credential short circuit, ends in
//! [`TurnController::finalize`], which stops the deadline timer and unlocks the
//! gate. The placeholder is always removed before the final message.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parley_config::{CredentialStore, DEFAULT_REQUEST_TIMEOUT};
use parley_providers::{
    CancellationToken, HttpReply, Transport, TransportError, error_message, extract_reply,
    parse_response_body,
};
use parley_types::{NonEmptyString, Role, TurnId, sanitize_terminal_text};

use crate::errors::{CREDENTIAL_HINT, EMPTY_REPLY_MESSAGE, TurnError};
use crate::gate::InputGate;
use crate::sink::RenderSink;
use crate::timer::DeadlineTimer;
use crate::turn::{Turn, TurnPhase, TurnReport};

/// Classified API answer.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Reply {
    Text(String),
    /// Valid response without any text; shown as [`EMPTY_REPLY_MESSAGE`].
    Empty,
}

pub struct TurnController<T, S, G> {
    transport: T,
    credentials: Arc<dyn CredentialStore>,
    sink: S,
    gate: G,
    timeout: Duration,
    next_id: AtomicU64,
}

impl<T, S, G> TurnController<T, S, G>
where
    T: Transport,
    S: RenderSink,
    G: InputGate,
{
    pub fn new(transport: T, credentials: Arc<dyn CredentialStore>, sink: S, gate: G) -> Self {
        Self {
            transport,
            credentials,
            sink,
            gate,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            next_id: AtomicU64::new(1),
        }
    }

    /// Replace the per-turn deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    #[must_use]
    pub fn gate(&self) -> &G {
        &self.gate
    }

    /// Run one turn for `input`.
    ///
    /// Returns `None` without any visible effect when the gate is locked or the
    /// trimmed input is empty. Otherwise the turn always renders exactly one
    /// assistant message and leaves the gate unlocked.
    pub async fn submit(&self, input: &str) -> Option<TurnReport> {
        if self.gate.is_locked() {
            tracing::debug!("Submission ignored: a turn is already in flight");
            return None;
        }
        let Ok(input) = NonEmptyString::new(input) else {
            return None;
        };

        let mut turn = Turn::submit(self.allocate_id(), input);
        self.gate.lock();
        self.sink
            .append_message(&sanitize_terminal_text(turn.input()), Role::User);
        self.gate.clear_entry();
        let placeholder = self.sink.append_placeholder();
        tracing::info!(turn = %turn.id(), input_bytes = turn.input().len(), "Turn submitted");

        let mut timer = None;
        let result = match self.credentials.get() {
            None => Err(TurnError::MissingCredential),
            Some(credential) => {
                turn.advance(TurnPhase::AwaitingResponse);
                let cancel = CancellationToken::new();
                let deadline = timer.insert(DeadlineTimer::start(self.timeout, cancel.clone()));
                let sent = self.transport.send(&credential, turn.input(), &cancel).await;
                self.classify(sent, deadline.fired())
            }
        };

        turn.conclude(result.as_ref().map(|_| ()));
        let degraded = matches!(result, Ok(Reply::Empty));
        let message = match &result {
            Ok(Reply::Text(text)) => text.clone(),
            Ok(Reply::Empty) => EMPTY_REPLY_MESSAGE.to_string(),
            Err(err) => self.failure_message(err),
        };
        self.sink.remove_placeholder(placeholder);
        self.sink
            .append_message(&sanitize_terminal_text(&message), Role::Assistant);

        Some(self.finalize(turn, timer, result.err(), degraded))
    }

    fn allocate_id(&self) -> TurnId {
        TurnId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn classify(
        &self,
        sent: Result<HttpReply, TransportError>,
        deadline_fired: bool,
    ) -> Result<Reply, TurnError> {
        match sent {
            Ok(reply) => classify_reply(reply),
            Err(_) if deadline_fired => Err(TurnError::Timeout {
                after: self.timeout,
            }),
            Err(e) => Err(TurnError::NetworkOrApiFailure {
                detail: e.to_string(),
            }),
        }
    }

    fn failure_message(&self, err: &TurnError) -> String {
        let mut message = err.user_message();
        if !matches!(err, TurnError::MissingCredential) && !self.credentials.is_configured() {
            message.push_str("\n\n");
            message.push_str(CREDENTIAL_HINT);
        }
        message
    }

    fn finalize(
        &self,
        mut turn: Turn,
        timer: Option<DeadlineTimer>,
        error: Option<TurnError>,
        degraded: bool,
    ) -> TurnReport {
        if let Some(timer) = timer {
            timer.cancel();
        }
        self.gate.unlock();

        debug_assert!(
            turn.phase().is_terminal(),
            "turn {} finalized in phase {:?}",
            turn.id(),
            turn.phase()
        );

        let report = TurnReport {
            id: turn.id(),
            outcome: turn.outcome(),
            error,
            degraded,
            elapsed: turn.elapsed(),
        };
        turn.advance(TurnPhase::Idle);

        let elapsed_ms = report.elapsed.as_millis() as u64;
        match &report.error {
            None => tracing::info!(
                turn = %report.id,
                outcome = %report.outcome,
                degraded,
                elapsed_ms,
                "Turn finished"
            ),
            Some(err) => tracing::warn!(
                turn = %report.id,
                outcome = %report.outcome,
                kind = err.kind(),
                status = ?err.status(),
                elapsed_ms,
                error = %err,
                "Turn failed"
            ),
        }
        report
    }
}

/// Interpret a completed HTTP exchange.
///
/// The body must be JSON whatever the status. A failure status yields an API
/// error carrying the body's `error.message` when there is one.
fn classify_reply(reply: HttpReply) -> Result<Reply, TurnError> {
    let Ok(body) = parse_response_body(&reply.body) else {
        return Err(TurnError::InvalidResponse {
            status: reply.status,
        });
    };

    if !reply.is_success() {
        return Err(TurnError::ApiError {
            status: reply.status,
            message: error_message(&body),
        });
    }

    let text = extract_reply(&body);
    if text.is_empty() {
        Ok(Reply::Empty)
    } else {
        Ok(Reply::Text(text))
    }
}
