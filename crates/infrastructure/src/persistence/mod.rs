//! Persistence adapters: file system access and credential storage.

mod credential_store;
mod file_system;

pub use credential_store::{FileCredentialStore, MemoryCredentialStore};
pub use file_system::TokioFileSystem;
