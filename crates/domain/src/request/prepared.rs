//! Fully resolved request handed to the transport

use std::time::Duration;

use url::Url;

use super::{HttpMethod, RequestBody};

/// A request ready to go on the wire.
///
/// Produced by the executor after credential resolution and header
/// assembly; transports send it as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    /// HTTP verb.
    pub method: HttpMethod,
    /// Absolute URL including the query string.
    pub url: Url,
    /// Final header list.
    pub headers: Vec<(String, String)>,
    /// Body to send.
    pub body: RequestBody,
    /// Deadline the executor races this request against.
    pub timeout: Duration,
}

impl PreparedRequest {
    /// Returns the first header value matching `name` case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
