//! Reconciliation state for the notification sync engine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::notification::Notification;

/// Polling lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollingState {
    /// No timer armed.
    #[default]
    Idle,
    /// Timer armed, subscribers receive a cycle every interval.
    Polling,
}

/// One independently tracked server collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slice {
    /// Page 1 of `/notifications`.
    Notifications,
    /// Page 1 of `/notifications/announcements`.
    Announcements,
    /// `/notifications/unread-count`.
    UnreadCount,
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Notifications => "notifications",
            Self::Announcements => "announcements",
            Self::UnreadCount => "unread_count",
        })
    }
}

/// Last observed cardinality of each slice.
///
/// Change detection compares counts only, never contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NotificationSnapshot {
    /// Length of the last notifications page.
    pub notifications: usize,
    /// Length of the last announcements page.
    pub announcements: usize,
    /// Last unread count.
    pub unread: u64,
}

impl NotificationSnapshot {
    /// Returns the slices whose count differs from `previous`.
    #[must_use]
    pub fn changed_since(&self, previous: &Self) -> Vec<Slice> {
        let mut changed = Vec::new();
        if self.notifications != previous.notifications {
            changed.push(Slice::Notifications);
        }
        if self.announcements != previous.announcements {
            changed.push(Slice::Announcements);
        }
        if self.unread != previous.unread {
            changed.push(Slice::UnreadCount);
        }
        changed
    }
}

/// Result of one reconciliation cycle, handed to every subscriber.
///
/// Slices that failed this cycle carry their last known good value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncCycle {
    /// Latest notifications page.
    pub notifications: Vec<Notification>,
    /// Latest announcements page.
    pub announcements: Vec<Notification>,
    /// Latest unread count.
    pub unread_count: u64,
    /// True if any slice count differs from the previous snapshot.
    pub has_changes: bool,
    /// Slices whose read failed this cycle.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stale_slices: Vec<Slice>,
}

impl SyncCycle {
    /// Counts carried by this cycle.
    #[must_use]
    pub fn snapshot(&self) -> NotificationSnapshot {
        NotificationSnapshot {
            notifications: self.notifications.len(),
            announcements: self.announcements.len(),
            unread: self.unread_count,
        }
    }

    /// Whether `slice` was served from stale data this cycle.
    #[must_use]
    pub fn is_stale(&self, slice: Slice) -> bool {
        self.stale_slices.contains(&slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_changed_since() {
        let before = NotificationSnapshot {
            notifications: 3,
            announcements: 2,
            unread: 1,
        };
        let after = NotificationSnapshot {
            announcements: 5,
            ..before
        };
        assert_eq!(after.changed_since(&before), vec![Slice::Announcements]);
        assert!(before.changed_since(&before).is_empty());
    }

    #[test]
    fn test_zero_snapshot_sees_every_nonzero_count() {
        let fresh = NotificationSnapshot::default();
        let observed = NotificationSnapshot {
            notifications: 1,
            announcements: 0,
            unread: 4,
        };
        assert_eq!(
            observed.changed_since(&fresh),
            vec![Slice::Notifications, Slice::UnreadCount]
        );
    }
}
