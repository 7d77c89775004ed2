//! Push platform for hosts without a native push service.
//!
//! The permission decision and device token are fixed at construction.
//! Foreground events are delivered by calling [`StaticPushPlatform::dispatch`],
//! which makes the adapter usable from a CLI or from tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use courtyard_application::ports::{
    ForegroundEvent, ForegroundListener, ListenerHandle, PushPermission, PushPlatform,
    PushPlatformError,
};
use parking_lot::RwLock;
use tracing::debug;

/// Fixed-answer push platform with an in-process listener registry.
pub struct StaticPushPlatform {
    permission: PushPermission,
    token: Option<String>,
    listeners: RwLock<BTreeMap<u64, ForegroundListener>>,
    next_id: AtomicU64,
}

impl StaticPushPlatform {
    /// A platform that grants permission and hands out `token`.
    #[must_use]
    pub fn granted(token: impl Into<String>) -> Self {
        Self::new(PushPermission::Granted, Some(token.into()))
    }

    /// A platform whose user refused notifications.
    #[must_use]
    pub fn denied() -> Self {
        Self::new(PushPermission::Denied, None)
    }

    fn new(permission: PushPermission, token: Option<String>) -> Self {
        Self {
            permission,
            token,
            listeners: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Delivers `event` to every installed listener in installation order.
    /// Returns how many listeners saw it.
    pub fn dispatch(&self, event: &ForegroundEvent) -> usize {
        let listeners: Vec<ForegroundListener> = self.listeners.read().values().cloned().collect();
        for listener in &listeners {
            listener(event);
        }
        listeners.len()
    }

    /// Number of installed listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

#[async_trait]
impl PushPlatform for StaticPushPlatform {
    async fn request_permission(&self) -> Result<PushPermission, PushPlatformError> {
        Ok(self.permission)
    }

    async fn acquire_token(&self) -> Result<String, PushPlatformError> {
        self.token
            .clone()
            .ok_or_else(|| PushPlatformError::TokenUnavailable("no device token configured".into()))
    }

    fn add_foreground_listener(
        &self,
        listener: ForegroundListener,
    ) -> Result<ListenerHandle, PushPlatformError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.write().insert(id, listener);
        debug!(id, "foreground listener installed");
        Ok(ListenerHandle::new(id))
    }

    fn remove_listener(&self, handle: ListenerHandle) {
        if self.listeners.write().remove(&handle.id()).is_some() {
            debug!(id = handle.id(), "foreground listener removed");
        }
    }
}
