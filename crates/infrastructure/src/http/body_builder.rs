//! HTTP request body builder.
//!
//! Attaches a domain `RequestBody` to a reqwest request. Upload bodies
//! never get an explicit `Content-Type` from the executor, so the builder
//! sets it here: reqwest writes the multipart boundary, and opaque binary
//! bodies go out as `application/octet-stream`.

use courtyard_application::ports::TransportError;
use courtyard_domain::{MultipartField, RequestBody};
use reqwest::RequestBuilder;
use reqwest::multipart::{Form, Part};

/// Attaches `body` to `builder`.
///
/// # Errors
///
/// Returns [`TransportError::InvalidRequest`] if a part's explicit MIME
/// type does not parse or the JSON document cannot be encoded.
pub fn apply_body(
    builder: RequestBuilder,
    body: RequestBody,
) -> Result<RequestBuilder, TransportError> {
    match body {
        RequestBody::None => Ok(builder),

        RequestBody::Json(value) => {
            let bytes = serde_json::to_vec(&value)
                .map_err(|e| TransportError::InvalidRequest(format!("Invalid JSON: {e}")))?;
            Ok(builder.body(bytes))
        }

        RequestBody::Multipart(fields) => Ok(builder.multipart(build_multipart_form(fields)?)),

        RequestBody::Binary(content) => Ok(builder
            .header("Content-Type", "application/octet-stream")
            .body(content)),
    }
}

/// Build a multipart form from in-memory fields.
fn build_multipart_form(fields: Vec<MultipartField>) -> Result<Form, TransportError> {
    let mut form = Form::new();

    for field in fields {
        match field {
            MultipartField::Text { name, value } => {
                form = form.text(name, value);
            }
            MultipartField::File {
                name,
                file_name,
                content,
                content_type,
            } => {
                let mime = content_type.unwrap_or_else(|| {
                    mime_guess::from_path(&file_name)
                        .first_or_octet_stream()
                        .to_string()
                });
                let part = Part::bytes(content)
                    .file_name(file_name)
                    .mime_str(&mime)
                    .map_err(|e| {
                        TransportError::InvalidRequest(format!("Invalid MIME type {mime}: {e}"))
                    })?;
                form = form.part(name, part);
            }
        }
    }

    Ok(form)
}
