//! Per-call request description

use super::{HttpMethod, QueryParams, RequestBody};

/// What a caller wants sent: path, verb, body and header overrides.
///
/// Built per call and discarded once the call resolves. The path is
/// relative to the configured API base and decides which credential is
/// attached.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestDescriptor {
    /// Route path, e.g. `/notifications/unread-count`.
    pub path: String,
    /// HTTP verb.
    pub method: HttpMethod,
    /// Query string parameters.
    pub query: QueryParams,
    /// Request body.
    pub body: RequestBody,
    /// Extra headers applied after the executor's defaults.
    pub headers: Vec<(String, String)>,
}

impl RequestDescriptor {
    /// Creates a descriptor for `method` on `path` with no body.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            ..Self::default()
        }
    }

    /// Creates a GET descriptor.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Sets the query parameters.
    #[must_use]
    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Adds a header override.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns the path without any inline query string.
    #[must_use]
    pub fn route(&self) -> &str {
        self.path.split('?').next().unwrap_or_default()
    }
}
