//! Backend JSON envelope

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::failure::{ErrorKind, FieldError, RequestFailure};

/// `{ success, data?, message?, errors? }`, the shape every backend route
/// answers with.
///
/// When `success` is false, `data` must not be treated as domain data;
/// [`ResponseEnvelope::into_data`] enforces that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope<T = serde_json::Value> {
    /// Server-side success flag.
    #[serde(default)]
    pub success: bool,
    /// Payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Field-level validation errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl<T> ResponseEnvelope<T> {
    /// Returns the payload only when the envelope reports success.
    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        if self.success { self.data.as_ref() } else { None }
    }

    /// Consumes the envelope, yielding its payload.
    ///
    /// # Errors
    ///
    /// A `success: false` envelope becomes a `ValidationFailed` failure
    /// carrying the server's message and field errors. A successful
    /// envelope without data is `MalformedResponse`.
    pub fn into_data(self) -> Result<T, RequestFailure> {
        if !self.success {
            return Err(self.into_rejection());
        }
        self.data.ok_or_else(|| {
            RequestFailure::new(ErrorKind::MalformedResponse, "Response carried no data")
        })
    }

    /// Checks the success flag only, for routes that answer without data.
    ///
    /// # Errors
    ///
    /// A `success: false` envelope becomes a `ValidationFailed` failure.
    pub fn into_ack(self) -> Result<(), RequestFailure> {
        if self.success {
            Ok(())
        } else {
            Err(self.into_rejection())
        }
    }

    fn into_rejection(self) -> RequestFailure {
        let message = self
            .message
            .unwrap_or_else(|| "The request was rejected".to_string());
        RequestFailure::validation(message, self.errors.unwrap_or_default())
    }
}

impl ResponseEnvelope<serde_json::Value> {
    /// Re-types the payload.
    ///
    /// # Errors
    ///
    /// Returns `MalformedResponse` if the payload does not match `T`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<ResponseEnvelope<T>, RequestFailure> {
        let data = self
            .data
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| {
                RequestFailure::new(
                    ErrorKind::MalformedResponse,
                    format!("Unexpected response shape: {e}"),
                )
            })?;
        Ok(ResponseEnvelope {
            success: self.success,
            data,
            message: self.message,
            errors: self.errors,
        })
    }
}
