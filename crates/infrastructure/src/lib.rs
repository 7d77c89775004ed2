//! Courtyard Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer.

pub mod adapters;
pub mod http;
pub mod persistence;
pub mod serialization;
pub mod settings;

pub use adapters::{ReqwestTransport, StaticPushPlatform};
pub use http::apply_body;
pub use persistence::{FileCredentialStore, MemoryCredentialStore, TokioFileSystem};
pub use serialization::{SerializationError, from_json_bytes, to_json_stable, to_json_stable_bytes};
pub use settings::{SettingsError, SettingsLoader};
