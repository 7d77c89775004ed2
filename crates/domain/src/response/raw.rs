//! Raw transport response

use std::collections::HashMap;

use super::StatusCode;

/// What came back over the wire, before any envelope parsing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response headers, names lower-cased.
    pub headers: HashMap<String, String>,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Creates a response, normalising header names to lower case.
    #[must_use]
    pub fn new(
        status: impl Into<StatusCode>,
        headers: impl IntoIterator<Item = (String, String)>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            status: status.into(),
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v))
                .collect(),
            body,
        }
    }

    /// Shorthand for a JSON response, used heavily by tests and fakes.
    #[must_use]
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self::new(
            status,
            [("content-type".to_string(), "application/json".to_string())],
            body.to_string().into_bytes(),
        )
    }

    /// Returns the `Content-Type` header value, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }

    /// Returns true if the content type is JSON (`application/json` or a
    /// `+json` suffix type).
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.content_type()
            .and_then(|ct| ct.parse::<mime::Mime>().ok())
            .is_some_and(|m| {
                m.subtype() == mime::JSON || m.suffix().is_some_and(|s| s == mime::JSON)
            })
    }

    /// Returns the body as a lossy UTF-8 string.
    #[must_use]
    pub fn body_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
