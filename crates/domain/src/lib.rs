//! Courtyard Domain - Core client types
//!
//! This crate defines the model shared by the request executor and the
//! notification sync engine. All types here are pure Rust with no I/O
//! dependencies.

pub mod credential;
pub mod error;
pub mod failure;
pub mod notification;
pub mod request;
pub mod response;
pub mod settings;
pub mod sync;

pub use credential::{CredentialScope, RouteTable};
pub use error::{DomainError, DomainResult};
pub use failure::{
    ErrorKind, FieldError, RequestFailure, RequestResult, NETWORK_UNREACHABLE_MESSAGE,
    SESSION_EXPIRED_MESSAGE,
};
pub use notification::{Notification, UnreadCount};
pub use request::{
    HttpMethod, MultipartField, PreparedRequest, QueryParams, RequestBody, RequestDescriptor,
};
pub use response::{RawResponse, ResponseEnvelope, StatusCode};
pub use settings::{ClientSettings, RouteSettings};
pub use sync::{NotificationSnapshot, PollingState, Slice, SyncCycle};
