//! Device push-token registration.
//!
//! Permission, then token acquisition under the retry policy, then
//! submission under the same policy. The two retry loops are independent:
//! a failed submission never re-acquires the token.

use std::sync::Arc;

use courtyard_domain::RequestFailure;
use thiserror::Error;
use tracing::{info, warn};

use crate::ports::{NotificationFeed, PushPermission, PushPlatform, PushPlatformError};
use crate::retry::RetryPolicy;

/// Why registration gave up.
#[derive(Debug, Error)]
pub enum PushRegistrationError {
    /// The platform never handed out a token.
    #[error("could not obtain a push token after {attempts} attempts: {source}")]
    TokenUnavailable {
        /// Attempts made.
        attempts: u32,
        /// Last platform error.
        source: PushPlatformError,
    },

    /// The backend never accepted the token.
    #[error("could not register the push token after {attempts} attempts: {source}")]
    Submission {
        /// Attempts made.
        attempts: u32,
        /// Last classified failure.
        source: RequestFailure,
    },
}

/// Registers this device for push delivery.
pub struct PushRegistrar {
    platform: Arc<dyn PushPlatform>,
    feed: Arc<dyn NotificationFeed>,
    policy: RetryPolicy,
}

impl PushRegistrar {
    /// Creates a registrar using `policy` for both acquisition and submission.
    pub fn new(
        platform: Arc<dyn PushPlatform>,
        feed: Arc<dyn NotificationFeed>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            platform,
            feed,
            policy,
        }
    }

    /// The platform listeners are installed on.
    pub fn platform(&self) -> &dyn PushPlatform {
        self.platform.as_ref()
    }

    /// Runs the registration flow.
    ///
    /// Returns `Ok(None)` when the user refused permission; that is an
    /// expected outcome, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error when either retry loop runs out of attempts.
    pub async fn register(&self) -> Result<Option<String>, PushRegistrationError> {
        match self.platform.request_permission().await {
            Ok(PushPermission::Granted) => {}
            Ok(PushPermission::Denied) => {
                info!("push permission denied; registration skipped");
                return Ok(None);
            }
            Err(e) => {
                warn!(error = %e, "push permission unavailable; registration skipped");
                return Ok(None);
            }
        }

        let attempts = self.policy.max_attempts();
        let token = self
            .policy
            .run("push token acquisition", |_| self.platform.acquire_token())
            .await
            .map_err(|source| PushRegistrationError::TokenUnavailable { attempts, source })?;

        self.policy
            .run("push token submission", |_| self.feed.register_push_token(&token))
            .await
            .map_err(|source| PushRegistrationError::Submission { attempts, source })?;

        info!("push token registered");
        Ok(Some(token))
    }
}
