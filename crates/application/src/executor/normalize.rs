//! Turns a raw transport response into an envelope or a classified failure.

use courtyard_domain::{ErrorKind, RawResponse, RequestFailure, RequestResult, ResponseEnvelope};

/// Interprets `raw` without any knowledge of credentials.
///
/// A 401 always comes back as `Unauthorized` carrying whatever the server
/// said; the executor decides whether to purge and rewrite the message.
pub(super) fn interpret(raw: &RawResponse) -> RequestResult<ResponseEnvelope> {
    if raw.status.is_success() {
        return parse_success(raw);
    }

    let envelope = if raw.is_json() {
        serde_json::from_slice::<ResponseEnvelope>(&raw.body).ok()
    } else {
        None
    };
    let (message, errors) = envelope.map_or((None, None), |e| {
        (e.message.filter(|m| !m.trim().is_empty()), e.errors)
    });

    if raw.status.as_u16() == 401 {
        return Err(RequestFailure::new(
            ErrorKind::Unauthorized,
            message.unwrap_or_else(|| "Invalid credentials.".to_string()),
        ));
    }

    if let Some(field_errors) = errors {
        return Err(RequestFailure::validation(
            message.unwrap_or_else(|| "Please correct the highlighted fields.".to_string()),
            field_errors,
        ));
    }

    if raw.status.is_server_error() {
        return Err(RequestFailure::new(
            ErrorKind::ServerFault,
            message.unwrap_or_else(|| {
                format!(
                    "The server ran into a problem ({}). Please try again later.",
                    raw.status
                )
            }),
        ));
    }

    Err(RequestFailure::validation(
        message.unwrap_or_else(|| format!("Request failed ({})", raw.status)),
        Vec::new(),
    ))
}

fn parse_success(raw: &RawResponse) -> RequestResult<ResponseEnvelope> {
    if !raw.is_json() {
        let content_type = raw.content_type().unwrap_or("no content type");
        return Err(RequestFailure::new(
            ErrorKind::MalformedResponse,
            format!("Expected a JSON response but received {content_type}"),
        ));
    }

    serde_json::from_slice(&raw.body).map_err(|e| {
        RequestFailure::new(
            ErrorKind::MalformedResponse,
            format!("Response body is not a valid envelope: {e}"),
        )
    })
}
