//! Credential store implementations.
//!
//! The file-backed store keeps both scopes in one JSON document:
//! ```json
//! {
//!   "credentials": {
//!     "admin_token": "eyJ...",
//!     "resident_token": "eyJ..."
//!   },
//!   "schema_version": 1
//! }
//! ```
//! Writes go to a sibling temp file first and are renamed into place.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use courtyard_application::ports::{
    CredentialStore, CredentialStoreError, FileSystem, FileSystemError,
};
use courtyard_domain::CredentialScope;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use crate::serialization::{from_json_bytes, to_json_stable_bytes};

const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(default)]
    credentials: BTreeMap<String, String>,
    #[serde(default = "schema_version")]
    schema_version: u32,
}

const fn schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Credential store persisted as `credentials.json`.
#[derive(Debug)]
pub struct FileCredentialStore<F> {
    fs: F,
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl<F: FileSystem> FileCredentialStore<F> {
    /// Creates a store backed by the file at `path`.
    pub fn new(fs: F, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// `<config dir>/courtyard/credentials.json`, if the platform has a
    /// config directory.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("courtyard").join("credentials.json"))
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<CredentialFile, CredentialStoreError> {
        let bytes = match self.fs.read_file(&self.path).await {
            Ok(bytes) => bytes,
            Err(FileSystemError::NotFound(_)) => return Ok(CredentialFile::default()),
            Err(e) => return Err(e.into()),
        };
        let document: CredentialFile = from_json_bytes(&bytes)
            .map_err(|e| CredentialStoreError::Serialization(e.to_string()))?;
        if document.schema_version > SCHEMA_VERSION {
            return Err(CredentialStoreError::Serialization(format!(
                "unsupported credential file version {}",
                document.schema_version
            )));
        }
        Ok(document)
    }

    async fn write_document(&self, document: &CredentialFile) -> Result<(), CredentialStoreError> {
        let content = to_json_stable_bytes(document)
            .map_err(|e| CredentialStoreError::Serialization(e.to_string()))?;
        let staging = self.path.with_extension("json.tmp");
        self.fs.write_file(&staging, &content).await?;
        self.fs.rename(&staging, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl<F: FileSystem> CredentialStore for FileCredentialStore<F> {
    async fn load(&self, scope: CredentialScope) -> Result<Option<String>, CredentialStoreError> {
        let document = self.read_document().await?;
        Ok(document.credentials.get(scope.storage_key()).cloned())
    }

    async fn save(&self, scope: CredentialScope, token: &str) -> Result<(), CredentialStoreError> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document().await?;
        document
            .credentials
            .insert(scope.storage_key().to_string(), token.to_string());
        document.schema_version = SCHEMA_VERSION;
        self.write_document(&document).await
    }

    async fn purge(&self, scope: CredentialScope) -> Result<(), CredentialStoreError> {
        let _guard = self.write_lock.lock().await;
        if !self.fs.exists(&self.path).await {
            return Ok(());
        }
        let mut document = self.read_document().await?;
        if document.credentials.remove(scope.storage_key()).is_none() {
            return Ok(());
        }
        self.write_document(&document).await
    }
}

/// Thread-safe in-memory credential store.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    tokens: Arc<RwLock<HashMap<CredentialScope, String>>>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self, scope: CredentialScope) -> Result<Option<String>, CredentialStoreError> {
        let tokens = self.tokens.read().await;
        Ok(tokens.get(&scope).cloned())
    }

    async fn save(&self, scope: CredentialScope, token: &str) -> Result<(), CredentialStoreError> {
        let mut tokens = self.tokens.write().await;
        tokens.insert(scope, token.to_string());
        Ok(())
    }

    async fn purge(&self, scope: CredentialScope) -> Result<(), CredentialStoreError> {
        let mut tokens = self.tokens.write().await;
        tokens.remove(&scope);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::TokioFileSystem;
    use pretty_assertions::assert_eq;

    fn store(dir: &tempfile::TempDir) -> FileCredentialStore<TokioFileSystem> {
        FileCredentialStore::new(TokioFileSystem::new(), dir.path().join("credentials.json"))
    }

    #[tokio::test]
    async fn test_scopes_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        store.save(CredentialScope::Standard, "resident").await.unwrap();
        store.save(CredentialScope::Elevated, "admin").await.unwrap();
        store.purge(CredentialScope::Standard).await.unwrap();

        assert_eq!(store.load(CredentialScope::Standard).await.unwrap(), None);
        assert_eq!(
            store.load(CredentialScope::Elevated).await.unwrap().as_deref(),
            Some("admin")
        );
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        store(&dir)
            .save(CredentialScope::Standard, "resident")
            .await
            .unwrap();

        let reopened = store(&dir);
        assert_eq!(
            reopened.load(CredentialScope::Standard).await.unwrap().as_deref(),
            Some("resident")
        );

        let raw = std::fs::read_to_string(reopened.path()).unwrap();
        assert!(raw.contains("\"resident_token\": \"resident\""));
        assert!(raw.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_purge_absent_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        store.purge(CredentialScope::Elevated).await.unwrap();
        store.purge_all().await.unwrap();

        assert!(!dir.path().join("credentials.json").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("credentials.json"), b"not json").unwrap();

        let result = store(&dir).load(CredentialScope::Standard).await;
        assert!(matches!(result, Err(CredentialStoreError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryCredentialStore::new();
        store.save(CredentialScope::Elevated, "a").await.unwrap();
        let shared = store.clone();
        assert_eq!(
            shared.load(CredentialScope::Elevated).await.unwrap().as_deref(),
            Some("a")
        );
        shared.purge(CredentialScope::Elevated).await.unwrap();
        assert_eq!(store.load(CredentialScope::Elevated).await.unwrap(), None);
    }
}
