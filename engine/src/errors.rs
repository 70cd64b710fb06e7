//! Turn failure taxonomy and the user-facing wording for each kind.

use std::time::Duration;

use thiserror::Error;

/// Shown instead of a reply when no credential is stored.
pub const MISSING_CREDENTIAL_MESSAGE: &str =
    "Add your Gemini API key to start chatting. Type /key to enter it.";

/// Shown when the API answered but produced no text.
pub const EMPTY_REPLY_MESSAGE: &str = "Sorry, I could not generate a response. Please try again.";

/// Appended to failure messages while no credential is configured.
pub const CREDENTIAL_HINT: &str = "No API key is configured. Type /key to add one.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    #[error("no credential configured")]
    MissingCredential,
    #[error("unreadable response body (HTTP {status})")]
    InvalidResponse { status: u16 },
    #[error("API error (HTTP {status}): {}", message.as_deref().unwrap_or("no message"))]
    ApiError {
        status: u16,
        message: Option<String>,
    },
    #[error("no response within {}ms", after.as_millis())]
    Timeout { after: Duration },
    #[error("request failed: {detail}")]
    NetworkOrApiFailure { detail: String },
}

impl TurnError {
    /// Stable label for log records.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::InvalidResponse { .. } => "invalid_response",
            Self::ApiError { .. } => "api_error",
            Self::Timeout { .. } => "timeout",
            Self::NetworkOrApiFailure { .. } => "network",
        }
    }

    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::InvalidResponse { status } | Self::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Plain-language text rendered as the assistant turn.
    ///
    /// Status codes and transport detail stay in the logs. The one exception is
    /// the API's own `error.message`, which is the useful part of an API error.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingCredential => MISSING_CREDENTIAL_MESSAGE.to_string(),
            Self::InvalidResponse { .. } => {
                "The API sent a response that could not be read. Please try again.".to_string()
            }
            Self::ApiError {
                message: Some(message),
                ..
            } => format!("The API returned an error: {message}"),
            Self::ApiError { message: None, .. } => {
                "The API request was rejected. Please try again later.".to_string()
            }
            Self::Timeout { after } => format!(
                "The request timed out after {} and was cancelled. Please try again.",
                format_duration(*after)
            ),
            Self::NetworkOrApiFailure { .. } => {
                "Could not reach the API. Check your connection and try again.".to_string()
            }
        }
    }
}

fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis % 1000 == 0 {
        let secs = millis / 1000;
        if secs == 1 {
            "1 second".to_string()
        } else {
            format!("{secs} seconds")
        }
    } else {
        format!("{millis}ms")
    }
}
