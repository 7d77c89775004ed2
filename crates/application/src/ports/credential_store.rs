//! Credential store port
//!
//! One bearer credential per [`CredentialScope`], persisted across runs.

use async_trait::async_trait;
use courtyard_domain::CredentialScope;

/// Errors that can occur while reading or writing credentials.
#[derive(Debug, thiserror::Error)]
pub enum CredentialStoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Persistent key-value store for bearer credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Reads the credential for `scope`, if one is stored.
    async fn load(&self, scope: CredentialScope) -> Result<Option<String>, CredentialStoreError>;

    /// Stores `token` for `scope`, replacing any previous value.
    async fn save(&self, scope: CredentialScope, token: &str) -> Result<(), CredentialStoreError>;

    /// Removes the credential for `scope`. Removing an absent credential
    /// is not an error.
    async fn purge(&self, scope: CredentialScope) -> Result<(), CredentialStoreError>;

    /// Removes every scope's credential.
    async fn purge_all(&self) -> Result<(), CredentialStoreError> {
        for scope in CredentialScope::all() {
            self.purge(scope).await?;
        }
        Ok(())
    }
}
