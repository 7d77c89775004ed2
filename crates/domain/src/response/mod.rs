//! Response-side types: status codes, raw transport responses and the
//! backend's JSON envelope.

mod envelope;
mod raw;
mod status;

pub use envelope::ResponseEnvelope;
pub use raw::RawResponse;
pub use status::StatusCode;
