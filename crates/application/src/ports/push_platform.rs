//! Push platform port
//!
//! The OS-level push service: permission prompt, device token, and the
//! foreground delivery hook.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Outcome of the permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushPermission {
    /// The user allowed notifications.
    Granted,
    /// The user refused, or the platform cannot show notifications.
    Denied,
}

/// A push message delivered while the app is in the foreground.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForegroundEvent {
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub body: String,
    /// Opaque payload attached by the sender.
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Callback invoked for each foreground push.
pub type ForegroundListener = Arc<dyn Fn(&ForegroundEvent) + Send + Sync>;

/// Opaque handle returned when a foreground listener is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

impl ListenerHandle {
    /// Wraps a platform-assigned listener id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Platform-assigned listener id.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Errors raised by the push platform.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PushPlatformError {
    /// Push is not supported on this device.
    #[error("push notifications are not supported on this device")]
    Unsupported,

    /// The platform could not hand out a token right now.
    #[error("push token unavailable: {0}")]
    TokenUnavailable(String),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

/// Port for the device push service.
#[async_trait]
pub trait PushPlatform: Send + Sync {
    /// Asks the user for permission to show notifications.
    async fn request_permission(&self) -> Result<PushPermission, PushPlatformError>;

    /// Obtains the device push token.
    async fn acquire_token(&self) -> Result<String, PushPlatformError>;

    /// Installs a foreground listener.
    fn add_foreground_listener(
        &self,
        listener: ForegroundListener,
    ) -> Result<ListenerHandle, PushPlatformError>;

    /// Removes a previously installed listener. Unknown handles are ignored.
    fn remove_listener(&self, handle: ListenerHandle);
}
