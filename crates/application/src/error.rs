//! Application error types

use courtyard_domain::{DomainError, RequestFailure};
use thiserror::Error;

use crate::notifications::PushRegistrationError;
use crate::ports::CredentialStoreError;

/// Application-level errors.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// A request failed after classification.
    #[error("{}: {}", .0.kind.title(), .0)]
    Request(#[from] RequestFailure),

    /// The credential store could not be read or written.
    #[error("credential store error: {0}")]
    Credentials(#[from] CredentialStoreError),

    /// Push-token registration gave up.
    #[error("push registration failed: {0}")]
    Push(#[from] PushRegistrationError),
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
