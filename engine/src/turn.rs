//! Turn lifecycle: one submission, one outbound call, one terminal outcome.
//!
//! [`TurnPhase::can_transition_to`] is the single transition table. Callers go
//! through [`Turn::advance`], which refuses and logs any edge not in the table.

use std::fmt;
use std::time::{Duration, Instant};

use parley_types::{NonEmptyString, TurnId};

use crate::errors::TurnError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    Submitted,
    AwaitingResponse,
    Completed,
    Failed,
    TimedOut,
}

impl TurnPhase {
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        use TurnPhase::{AwaitingResponse, Completed, Failed, Idle, Submitted, TimedOut};

        matches!(
            (self, next),
            (Idle, Submitted)
                | (Submitted, AwaitingResponse)
                // Missing credential ends the turn before any request.
                | (Submitted, Failed)
                | (AwaitingResponse, Completed | Failed | TimedOut)
                | (Completed | Failed | TimedOut, Idle)
        )
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::TimedOut)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitted => "submitted",
            Self::AwaitingResponse => "awaiting_response",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Pending,
    Succeeded,
    Failed,
    TimedOut,
}

impl TurnOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for TurnOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One in-flight exchange, owned by the controller for its whole lifetime.
#[derive(Debug)]
pub struct Turn {
    id: TurnId,
    input: NonEmptyString,
    started_at: Instant,
    phase: TurnPhase,
    outcome: TurnOutcome,
}

impl Turn {
    /// A freshly submitted turn.
    #[must_use]
    pub fn submit(id: TurnId, input: NonEmptyString) -> Self {
        let mut turn = Self {
            id,
            input,
            started_at: Instant::now(),
            phase: TurnPhase::Idle,
            outcome: TurnOutcome::Pending,
        };
        turn.advance(TurnPhase::Submitted);
        turn
    }

    #[must_use]
    pub fn id(&self) -> TurnId {
        self.id
    }

    #[must_use]
    pub fn input(&self) -> &str {
        self.input.as_str()
    }

    #[must_use]
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    #[must_use]
    pub fn outcome(&self) -> TurnOutcome {
        self.outcome
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Move to `next` if the edge is legal. Returns whether the move happened.
    pub fn advance(&mut self, next: TurnPhase) -> bool {
        if !self.phase.can_transition_to(next) {
            tracing::error!(
                turn = %self.id,
                from = self.phase.as_str(),
                to = next.as_str(),
                "Illegal turn transition"
            );
            debug_assert!(false, "illegal turn transition {:?} -> {next:?}", self.phase);
            return false;
        }

        self.phase = next;
        match next {
            TurnPhase::Completed => self.outcome = TurnOutcome::Succeeded,
            TurnPhase::Failed => self.outcome = TurnOutcome::Failed,
            TurnPhase::TimedOut => self.outcome = TurnOutcome::TimedOut,
            TurnPhase::Idle | TurnPhase::Submitted | TurnPhase::AwaitingResponse => {}
        }
        true
    }

    /// Terminal phase for a classified result.
    pub fn conclude(&mut self, result: Result<(), &TurnError>) {
        let next = match result {
            Ok(()) => TurnPhase::Completed,
            Err(TurnError::Timeout { .. }) => TurnPhase::TimedOut,
            Err(_) => TurnPhase::Failed,
        };
        self.advance(next);
    }
}

/// What happened to a submission. Logged by the front-end, never rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub id: TurnId,
    pub outcome: TurnOutcome,
    pub error: Option<TurnError>,
    /// The API answered with no text and the fallback message was shown.
    pub degraded: bool,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn() -> Turn {
        Turn::submit(TurnId::new(1), NonEmptyString::new("Hello").unwrap())
    }

    #[test]
    fn happy_path_edges() {
        let mut turn = turn();
        assert_eq!(turn.phase(), TurnPhase::Submitted);
        assert_eq!(turn.outcome(), TurnOutcome::Pending);
        assert!(turn.advance(TurnPhase::AwaitingResponse));
        turn.conclude(Ok(()));
        assert_eq!(turn.phase(), TurnPhase::Completed);
        assert!(turn.advance(TurnPhase::Idle));
        assert_eq!(turn.outcome(), TurnOutcome::Succeeded);
    }

    #[test]
    fn timeout_concludes_timed_out() {
        let mut turn = turn();
        turn.advance(TurnPhase::AwaitingResponse);
        turn.conclude(Err(&TurnError::Timeout {
            after: Duration::from_secs(15),
        }));
        assert_eq!(turn.outcome(), TurnOutcome::TimedOut);
    }

    #[test]
    fn missing_credential_skips_awaiting() {
        let mut turn = turn();
        turn.conclude(Err(&TurnError::MissingCredential));
        assert_eq!(turn.phase(), TurnPhase::Failed);
    }

    #[test]
    fn table_rejects_shortcuts() {
        use TurnPhase::{AwaitingResponse, Completed, Idle, Submitted, TimedOut};
        assert!(!Idle.can_transition_to(AwaitingResponse));
        assert!(!Submitted.can_transition_to(Completed));
        assert!(!Submitted.can_transition_to(TimedOut));
        assert!(!Completed.can_transition_to(AwaitingResponse));
        assert!(!Idle.can_transition_to(Idle));
    }

    #[test]
    fn terminal_phases() {
        assert!(TurnPhase::Completed.is_terminal());
        assert!(TurnPhase::TimedOut.is_terminal());
        assert!(!TurnPhase::AwaitingResponse.is_terminal());
    }
}
