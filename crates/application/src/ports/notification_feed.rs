//! Notification feed port
//!
//! The three reads the sync engine reconciles each cycle, plus the
//! push-token submission call.

use async_trait::async_trait;
use courtyard_domain::{Notification, RequestResult};

/// Source of notification state.
#[async_trait]
pub trait NotificationFeed: Send + Sync {
    /// Page `page` of the user's notifications.
    async fn notifications(&self, page: u32, limit: u32) -> RequestResult<Vec<Notification>>;

    /// Page `page` of society announcements.
    async fn announcements(&self, page: u32, limit: u32) -> RequestResult<Vec<Notification>>;

    /// Current unread count.
    async fn unread_count(&self) -> RequestResult<u64>;

    /// Registers a device push token with the backend.
    async fn register_push_token(&self, token: &str) -> RequestResult<()>;
}
