//! HTTP transport port

use std::future::Future;

use courtyard_domain::request::PreparedRequest;
use courtyard_domain::{ErrorKind, RawResponse, RequestFailure};

/// Errors raised below the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The host name did not resolve.
    #[error("DNS resolution failed for {host}: {message}")]
    Dns {
        /// Host that failed to resolve.
        host: String,
        /// Resolver message.
        message: String,
    },

    /// The server actively refused the connection.
    #[error("connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// Any other connect-phase failure.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The transport's own deadline fired.
    #[error("transport timed out")]
    Timeout,

    /// The connection dropped while reading the body.
    #[error("failed to read response body: {0}")]
    Body(String),

    /// The request could not be built (bad header value, bad body).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

impl From<TransportError> for RequestFailure {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Timeout => Self::new(
                ErrorKind::Timeout,
                "The server took too long to respond. Please try again.",
            ),
            TransportError::InvalidRequest(message) => {
                Self::new(ErrorKind::ValidationFailed, message)
            }
            TransportError::Dns { .. }
            | TransportError::ConnectionRefused { .. }
            | TransportError::ConnectionFailed(_)
            | TransportError::Body(_)
            | TransportError::Other(_) => Self::network_unreachable(),
        }
    }
}

/// Port for putting a prepared request on the wire.
///
/// Implementations do no authentication, timeout racing or envelope
/// parsing; the executor owns all of that.
pub trait HttpTransport: Send + Sync {
    /// Sends the request and returns whatever came back.
    ///
    /// # Errors
    ///
    /// Returns an error only for failures below HTTP; any status code,
    /// including 4xx and 5xx, is a successful transport round-trip.
    fn send(
        &self,
        request: PreparedRequest,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}
