//! Core domain types for Parley.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

mod sanitize;
pub use sanitize::sanitize_terminal_text;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// NonEmptyString
// ============================================================================

/// A string guaranteed to be non-empty after trimming.
///
/// The stored value is the trimmed text: leading and trailing whitespace never
/// reaches the wire or the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyString(String);

#[derive(Debug, Error)]
#[error("message content must not be empty")]
pub struct EmptyStringError;

impl NonEmptyString {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyStringError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(EmptyStringError);
        }
        if trimmed.len() == value.len() {
            Ok(Self(value))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for NonEmptyString {
    type Error = EmptyStringError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for NonEmptyString {
    type Error = EmptyStringError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl std::ops::Deref for NonEmptyString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl AsRef<str> for NonEmptyString {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for NonEmptyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Roles
// ============================================================================

/// Sender of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "Gemini",
        }
    }
}

// ============================================================================
// Credential
// ============================================================================

/// The secret used to authenticate outbound API calls.
///
/// `Debug` never prints the value. Use [`Credential::masked`] for anything a
/// user can see and [`Credential::expose`] only when building the request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(NonEmptyString);

impl Credential {
    /// Returns `None` for blank input; a blank credential is the same as none.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        NonEmptyString::new(value).ok().map(Self)
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Display form that keeps the first and last four characters of long keys.
    #[must_use]
    pub fn masked(&self) -> String {
        const EDGE: usize = 4;
        const MIN_REVEAL_LEN: usize = 12;

        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= MIN_REVEAL_LEN {
            return "•".repeat(chars.len());
        }
        let head: String = chars[..EDGE].iter().collect();
        let tail: String = chars[chars.len() - EDGE..].iter().collect();
        format!("{head}{}{tail}", "•".repeat(chars.len() - EDGE * 2))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

// ============================================================================
// Turn identity
// ============================================================================

/// Process-unique identifier of one user turn, used to correlate log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TurnId(u64);

impl TurnId {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
