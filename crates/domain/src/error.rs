//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The provided URL is invalid or malformed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// A request path does not start with `/`.
    #[error("invalid request path: {0}")]
    InvalidPath(String),

    /// A query string could not be encoded.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A settings value is out of range.
    #[error("invalid setting `{field}`: {reason}")]
    InvalidSetting {
        /// Name of the offending setting.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
