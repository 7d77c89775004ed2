//! Component wiring.

use std::sync::Arc;

use courtyard_application::{
    ApplicationResult, CredentialStore, ExecutorConfig, HttpTransport, NotificationApi,
    NotificationSyncEngine, PollingConfig, PushPlatform, PushRegistrar, RequestExecutor,
    RetryPolicy,
};
use courtyard_domain::{ClientSettings, RequestFailure};
use courtyard_infrastructure::{
    FileCredentialStore, MemoryCredentialStore, ReqwestTransport, TokioFileSystem,
};
use tracing::{info, warn};

/// The executor and everything built on top of it, sharing one transport
/// and one credential store.
pub struct Client<T: HttpTransport> {
    settings: ClientSettings,
    executor: Arc<RequestExecutor<T>>,
    api: NotificationApi<T>,
}

impl Client<ReqwestTransport> {
    /// Builds a client talking to the real backend, with credentials
    /// persisted to the configured (or platform default) file.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or the HTTP client
    /// cannot be built.
    pub fn connect(settings: ClientSettings) -> ApplicationResult<Self> {
        let transport = ReqwestTransport::new().map_err(RequestFailure::from)?;
        let credentials: Arc<dyn CredentialStore> = match settings
            .credentials_path
            .clone()
            .or_else(FileCredentialStore::<TokioFileSystem>::default_path)
        {
            Some(path) => {
                info!(path = %path.display(), "Using credential file");
                Arc::new(FileCredentialStore::new(TokioFileSystem::new(), path))
            }
            None => {
                warn!("No config directory found, credentials will not survive this process");
                Arc::new(MemoryCredentialStore::new())
            }
        };
        Self::new(settings, Arc::new(transport), credentials)
    }
}

impl<T: HttpTransport + 'static> Client<T> {
    /// Builds a client over an explicit transport and credential store.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid.
    pub fn new(
        settings: ClientSettings,
        transport: Arc<T>,
        credentials: Arc<dyn CredentialStore>,
    ) -> ApplicationResult<Self> {
        let config = ExecutorConfig::from_settings(&settings)?;
        let executor = Arc::new(RequestExecutor::new(transport, credentials, config));
        let api = NotificationApi::new(Arc::clone(&executor));
        Ok(Self {
            settings,
            executor,
            api,
        })
    }

    /// Settings the client was built from.
    pub const fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Shared request executor.
    pub const fn executor(&self) -> &Arc<RequestExecutor<T>> {
        &self.executor
    }

    /// Notification endpoints.
    pub const fn notifications(&self) -> &NotificationApi<T> {
        &self.api
    }

    /// A sync engine reading through this client. With a push platform
    /// the engine can also register for push and host foreground
    /// listeners.
    pub fn sync_engine(&self, push: Option<Arc<dyn PushPlatform>>) -> NotificationSyncEngine {
        let feed = Arc::new(self.api.clone());
        let engine =
            NotificationSyncEngine::new(feed.clone(), PollingConfig::from_settings(&self.settings));
        match push {
            Some(platform) => {
                let policy = RetryPolicy::linear(
                    self.settings.retry_max_attempts,
                    self.settings.retry_base_delay(),
                );
                engine.with_push(PushRegistrar::new(platform, feed, policy))
            }
            None => engine,
        }
    }
}
