//! Shared request executor
//!
//! Every outbound call goes through [`RequestExecutor::execute`], which
//! picks the credential for the route, races the transport against the
//! matching deadline and the executor's cancellation scope, and turns
//! whatever happened into a [`ResponseEnvelope`] or a classified
//! [`RequestFailure`]. Nothing is retried here.

mod normalize;
mod verbs;

use std::sync::Arc;
use std::time::Duration;

use courtyard_domain::{
    ClientSettings, CredentialScope, DomainError, DomainResult, ErrorKind, PreparedRequest,
    RequestDescriptor, RequestFailure, RequestResult, ResponseEnvelope, RouteTable,
};
use serde::de::DeserializeOwned;
use tracing::{Instrument, debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::cancellation::CancellationScope;
use crate::ports::{CredentialStore, CredentialStoreError, HttpTransport};

/// Static executor configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Base every route path is joined onto. Always ends with `/`.
    pub base_url: Url,
    /// Deadline for JSON and bodiless requests.
    pub request_timeout: Duration,
    /// Deadline for multipart and binary uploads.
    pub upload_timeout: Duration,
    /// Credential policy per route.
    pub routes: RouteTable,
}

impl ExecutorConfig {
    /// Derives the executor configuration from validated settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings fail validation.
    pub fn from_settings(settings: &ClientSettings) -> DomainResult<Self> {
        settings.validate()?;
        Ok(Self {
            base_url: settings.base_url()?,
            request_timeout: settings.request_timeout(),
            upload_timeout: settings.upload_timeout(),
            routes: RouteTable::from(&settings.routes),
        })
    }
}

/// Single choke point for backend calls.
pub struct RequestExecutor<T: HttpTransport> {
    transport: Arc<T>,
    credentials: Arc<dyn CredentialStore>,
    config: ExecutorConfig,
    cancellation: CancellationScope,
}

impl<T: HttpTransport> RequestExecutor<T> {
    /// Creates an executor with a fresh cancellation scope.
    pub fn new(
        transport: Arc<T>,
        credentials: Arc<dyn CredentialStore>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            transport,
            credentials,
            config,
            cancellation: CancellationScope::new(),
        }
    }

    /// Returns the executor configuration.
    pub const fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Issues `descriptor` and returns the parsed envelope.
    ///
    /// # Errors
    ///
    /// Returns a [`RequestFailure`] carrying exactly one [`ErrorKind`]:
    /// `Unauthenticated` without touching the network when a protected
    /// route has no credential, `Timeout` when the deadline wins,
    /// `Cancelled` after [`cancel_all`](Self::cancel_all), and the
    /// classification of any non-2xx or non-JSON response otherwise.
    pub async fn execute(&self, descriptor: RequestDescriptor) -> RequestResult<ResponseEnvelope> {
        let span = tracing::debug_span!(
            "request",
            id = %Uuid::now_v7(),
            method = %descriptor.method,
            path = %descriptor.route(),
        );
        self.execute_in_span(descriptor).instrument(span).await
    }

    /// Issues `descriptor` and deserialises the envelope's `data` into `D`.
    ///
    /// # Errors
    ///
    /// Everything [`execute`](Self::execute) returns, plus
    /// `ValidationFailed` for a `success: false` envelope and
    /// `MalformedResponse` when the payload is missing or has the wrong
    /// shape.
    pub async fn execute_as<D: DeserializeOwned>(
        &self,
        descriptor: RequestDescriptor,
    ) -> RequestResult<D> {
        self.execute(descriptor).await?.decode::<D>()?.into_data()
    }

    /// Issues `descriptor` for a route that answers without data.
    ///
    /// # Errors
    ///
    /// Everything [`execute`](Self::execute) returns, plus
    /// `ValidationFailed` for a `success: false` envelope.
    pub async fn execute_ack(&self, descriptor: RequestDescriptor) -> RequestResult<()> {
        self.execute(descriptor).await?.into_ack()
    }

    /// Aborts every in-flight request and installs a fresh scope, so
    /// requests issued afterwards are unaffected.
    pub fn cancel_all(&self) {
        info!("cancelling all in-flight requests");
        self.cancellation.cancel_all();
    }

    /// Stores the credential for `scope` (after login).
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub async fn store_credential(
        &self,
        scope: CredentialScope,
        token: &str,
    ) -> Result<(), CredentialStoreError> {
        self.credentials.save(scope, token).await?;
        info!(%scope, "credential stored");
        Ok(())
    }

    /// Removes the credential for `scope` (logout). Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub async fn clear_credential(
        &self,
        scope: CredentialScope,
    ) -> Result<(), CredentialStoreError> {
        self.credentials.purge(scope).await?;
        info!(%scope, "credential cleared");
        Ok(())
    }

    /// Removes every scope's credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub async fn clear_all_credentials(&self) -> Result<(), CredentialStoreError> {
        self.credentials.purge_all().await?;
        info!("all credentials cleared");
        Ok(())
    }

    /// Whether a credential is currently stored for `scope`.
    pub async fn has_credential(&self, scope: CredentialScope) -> bool {
        self.load_credential(scope).await.is_some()
    }

    async fn execute_in_span(
        &self,
        descriptor: RequestDescriptor,
    ) -> RequestResult<ResponseEnvelope> {
        let token = self.cancellation.token();
        let route = descriptor.route().to_owned();
        let scope = self.config.routes.scope_for(&route);
        let credential = tokio::select! {
            biased;
            () = token.cancelled() => return Err(RequestFailure::cancelled()),
            loaded = self.load_credential(scope) => loaded,
        };

        if credential.is_none() && !self.config.routes.is_public(&route) {
            debug!(%scope, "no stored credential for protected route");
            return Err(RequestFailure::unauthenticated());
        }

        let request = self.prepare(descriptor, credential.as_deref())?;
        let deadline = request.timeout;

        let outcome = tokio::select! {
            biased;
            () = token.cancelled() => Err(RequestFailure::cancelled()),
            sent = self.transport.send(request) => sent.map_err(|e| {
                debug!(error = %e, "transport failure");
                RequestFailure::from(e)
            }),
            () = tokio::time::sleep(deadline) => {
                warn!(timeout_secs = deadline.as_secs(), "request timed out");
                Err(RequestFailure::timeout(deadline.as_secs()))
            }
        };

        let raw = outcome?;
        debug!(status = %raw.status, "response received");

        match normalize::interpret(&raw) {
            Err(failure)
                if failure.kind == ErrorKind::Unauthorized
                    && !self.config.routes.is_login(&route) =>
            {
                self.purge_after_rejection(scope).await;
                Err(RequestFailure::session_expired())
            }
            other => other,
        }
    }

    fn prepare(
        &self,
        descriptor: RequestDescriptor,
        credential: Option<&str>,
    ) -> RequestResult<PreparedRequest> {
        let RequestDescriptor {
            path,
            method,
            query,
            body,
            headers: overrides,
        } = descriptor;

        if !path.starts_with('/') || has_dot_segment(&path) {
            return Err(DomainError::InvalidPath(path).into());
        }
        let mut url = self
            .config
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| DomainError::InvalidUrl(format!("{e}: {path}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.pairs());
        }

        let upload = body.is_upload();
        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        if !upload {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        if let Some(token) = credential {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }

        for (name, value) in overrides {
            // Multipart boundaries come from the transport.
            if upload && name.eq_ignore_ascii_case("content-type") {
                debug!("ignoring Content-Type override on upload");
                continue;
            }
            match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&name)) {
                Some(existing) => existing.1 = value,
                None => headers.push((name, value)),
            }
        }

        let timeout = if upload {
            self.config.upload_timeout
        } else {
            self.config.request_timeout
        };

        Ok(PreparedRequest {
            method,
            url,
            headers,
            body,
            timeout,
        })
    }

    async fn load_credential(&self, scope: CredentialScope) -> Option<String> {
        match self.credentials.load(scope).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(%scope, error = %e, "failed to read stored credential");
                None
            }
        }
    }

    async fn purge_after_rejection(&self, scope: CredentialScope) {
        match self.credentials.purge(scope).await {
            Ok(()) => warn!(%scope, "server rejected credential; purged"),
            Err(e) => warn!(%scope, error = %e, "failed to purge rejected credential"),
        }
    }
}

/// `.` and `..` segments would be collapsed by URL joining after the
/// scope was chosen from the raw path.
fn has_dot_segment(path: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/').any(|segment| segment == "." || segment == "..")
}
