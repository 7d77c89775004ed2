//! Fakes shared by the executor and notification tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use courtyard_domain::{ClientSettings, CredentialScope, PreparedRequest, RawResponse};
use parking_lot::Mutex;

use crate::executor::{ExecutorConfig, RequestExecutor};
use crate::ports::{CredentialStore, CredentialStoreError, HttpTransport, TransportError};

pub const BASE_URL: &str = "http://api.test/api";

/// Transport giving the same reply to every request, optionally after a delay.
/// Per-path replies take precedence when registered.
pub struct CannedTransport {
    reply: Result<RawResponse, TransportError>,
    by_path: HashMap<String, RawResponse>,
    delay: Duration,
    calls: AtomicUsize,
    seen: Mutex<Vec<PreparedRequest>>,
}

impl CannedTransport {
    pub fn replying(response: RawResponse) -> Self {
        Self {
            reply: Ok(response),
            by_path: HashMap::new(),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: TransportError) -> Self {
        Self {
            reply: Err(error),
            ..Self::replying(RawResponse::default())
        }
    }

    /// Replies by URL path, e.g. `/api/notifications`; other paths get a 404.
    pub fn routing(routes: Vec<(&str, RawResponse)>) -> Self {
        Self {
            by_path: routes
                .into_iter()
                .map(|(path, reply)| (path.to_string(), reply))
                .collect(),
            ..Self::replying(RawResponse::json(404, &serde_json::json!({"success": false})))
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<PreparedRequest> {
        self.seen.lock().last().cloned()
    }
}

impl HttpTransport for CannedTransport {
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .by_path
            .get(request.url.path())
            .map_or_else(|| self.reply.clone(), |routed| Ok(routed.clone()));
        self.seen.lock().push(request);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        reply
    }
}

/// Credential store backed by a map, counting purges.
#[derive(Default)]
pub struct InMemoryCredentials {
    tokens: Mutex<HashMap<CredentialScope, String>>,
    purges: AtomicUsize,
    load_delay: Duration,
}

impl InMemoryCredentials {
    pub fn with(scope: CredentialScope, token: &str) -> Self {
        let store = Self::default();
        store.tokens.lock().insert(scope, token.to_string());
        store
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    pub fn get(&self, scope: CredentialScope) -> Option<String> {
        self.tokens.lock().get(&scope).cloned()
    }

    pub fn purges(&self) -> usize {
        self.purges.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentials {
    async fn load(&self, scope: CredentialScope) -> Result<Option<String>, CredentialStoreError> {
        if !self.load_delay.is_zero() {
            tokio::time::sleep(self.load_delay).await;
        }
        Ok(self.get(scope))
    }

    async fn save(&self, scope: CredentialScope, token: &str) -> Result<(), CredentialStoreError> {
        self.tokens.lock().insert(scope, token.to_string());
        Ok(())
    }

    async fn purge(&self, scope: CredentialScope) -> Result<(), CredentialStoreError> {
        self.purges.fetch_add(1, Ordering::SeqCst);
        self.tokens.lock().remove(&scope);
        Ok(())
    }
}

pub fn settings() -> ClientSettings {
    ClientSettings {
        base_url: BASE_URL.to_string(),
        ..ClientSettings::default()
    }
}

#[allow(clippy::unwrap_used)]
pub fn executor(
    transport: Arc<CannedTransport>,
    credentials: Arc<InMemoryCredentials>,
) -> RequestExecutor<CannedTransport> {
    let config = ExecutorConfig::from_settings(&settings()).unwrap();
    RequestExecutor::new(transport, credentials, config)
}
