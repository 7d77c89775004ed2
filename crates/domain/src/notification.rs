//! Notification records as served by the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A notification or announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Server identifier.
    #[serde(alias = "_id")]
    pub id: String,
    /// Headline.
    #[serde(default)]
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub message: String,
    /// Category, e.g. `announcement`, `payment`, `complaint`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Whether the current user has read it.
    #[serde(default)]
    pub is_read: bool,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload of `GET /notifications/unread-count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnreadCount {
    /// Number of unread notifications.
    pub count: u64,
}
