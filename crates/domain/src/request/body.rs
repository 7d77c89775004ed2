//! HTTP Request body types

use serde::Serialize;
use serde_json::Value;

/// One part of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartField {
    /// Plain text field.
    Text {
        /// Field name.
        name: String,
        /// Field value.
        value: String,
    },
    /// In-memory file part.
    File {
        /// Field name.
        name: String,
        /// File name reported to the server.
        file_name: String,
        /// Raw file content.
        content: Vec<u8>,
        /// Explicit MIME type; guessed from `file_name` when absent.
        content_type: Option<String>,
    },
}

impl MultipartField {
    /// Creates a text field.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Creates a file field whose MIME type is guessed from its name.
    #[must_use]
    pub fn file(name: impl Into<String>, file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self::File {
            name: name.into(),
            file_name: file_name.into(),
            content,
            content_type: None,
        }
    }
}

/// Body of an outbound request.
///
/// `Multipart` and `Binary` are upload-class payloads: they race the long
/// timeout and never carry an explicit `Content-Type` header.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    /// No body
    #[default]
    None,
    /// JSON document, sent as `application/json`.
    Json(Value),
    /// Multipart form upload.
    Multipart(Vec<MultipartField>),
    /// Opaque binary upload.
    Binary(Vec<u8>),
}

impl RequestBody {
    /// Serializes `value` into a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be represented as JSON.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Self::Json)
    }

    /// Returns true for multipart and binary payloads.
    #[must_use]
    pub const fn is_upload(&self) -> bool {
        matches!(self, Self::Multipart(_) | Self::Binary(_))
    }

    /// Returns whether there is no body at all.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}
