//! Classified request failures.
//!
//! Every failure the executor hands back carries exactly one [`ErrorKind`]
//! and a human-readable message, so callers can branch on the kind and
//! show the message without inspecting server text.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message surfaced for every `Unauthorized` outcome on a non-login route.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Message surfaced when the server cannot be reached at all.
pub const NETWORK_UNREACHABLE_MESSAGE: &str =
    "Unable to reach the server. Please check your connection and try again.";

/// Failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No credential is stored for a protected route.
    Unauthenticated,

    /// The server rejected the credential (HTTP 401).
    Unauthorized,

    /// The request lost its race against the deadline.
    Timeout,

    /// DNS, connect or mid-body network failure.
    NetworkUnreachable,

    /// HTTP 5xx.
    ServerFault,

    /// The server refused the request; may carry field errors.
    ValidationFailed,

    /// The body was not the JSON envelope we expected.
    MalformedResponse,

    /// Aborted through `cancel_all`.
    Cancelled,
}

impl ErrorKind {
    /// Returns a human-readable title for this error type.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "Not Signed In",
            Self::Unauthorized => "Session Expired",
            Self::Timeout => "Request Timeout",
            Self::NetworkUnreachable => "No Connection",
            Self::ServerFault => "Server Error",
            Self::ValidationFailed => "Request Rejected",
            Self::MalformedResponse => "Unexpected Response",
            Self::Cancelled => "Request Cancelled",
        }
    }

    /// Returns true when the user has to sign in again.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(self, Self::Unauthenticated | Self::Unauthorized)
    }
}

/// One field-level validation error, `{ field, message }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Offending field.
    #[serde(default)]
    pub field: String,
    /// What is wrong with it.
    #[serde(default, alias = "msg")]
    pub message: String,
}

/// A classified failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RequestFailure {
    /// Classification.
    pub kind: ErrorKind,
    /// Text suitable for showing to the user.
    pub message: String,
    /// Field errors, only populated for `ValidationFailed`.
    pub field_errors: Vec<FieldError>,
}

impl RequestFailure {
    /// Creates a failure without field errors.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            field_errors: Vec::new(),
        }
    }

    /// Creates a `ValidationFailed` failure carrying `field_errors` verbatim.
    #[must_use]
    pub fn validation(message: impl Into<String>, field_errors: Vec<FieldError>) -> Self {
        Self {
            kind: ErrorKind::ValidationFailed,
            message: message.into(),
            field_errors,
        }
    }

    /// `Unauthenticated` with the standard sign-in prompt.
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::new(ErrorKind::Unauthenticated, "Please log in to continue.")
    }

    /// `Unauthorized` with the fixed session-expiry text.
    #[must_use]
    pub fn session_expired() -> Self {
        Self::new(ErrorKind::Unauthorized, SESSION_EXPIRED_MESSAGE)
    }

    /// `NetworkUnreachable` with the standard connection hint.
    #[must_use]
    pub fn network_unreachable() -> Self {
        Self::new(ErrorKind::NetworkUnreachable, NETWORK_UNREACHABLE_MESSAGE)
    }

    /// `Cancelled`.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "The request was cancelled.")
    }

    /// `Timeout` after `secs` seconds.
    #[must_use]
    pub fn timeout(secs: u64) -> Self {
        Self::new(
            ErrorKind::Timeout,
            format!("The server took longer than {secs}s to respond. Please try again."),
        )
    }
}

impl From<crate::error::DomainError> for RequestFailure {
    fn from(error: crate::error::DomainError) -> Self {
        Self::new(ErrorKind::ValidationFailed, error.to_string())
    }
}

/// Result type for executor calls.
pub type RequestResult<T> = Result<T, RequestFailure>;
