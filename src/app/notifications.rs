//! Notification queue.
//!
//! Short-lived user-facing messages. Each notification carries its own
//! time-to-live; [`NotificationQueue::expire`] drops the ones whose TTL has
//! elapsed as of the supplied instant. A TTL of zero means "until dismissed".

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default lifetime of a notification.
pub const DEFAULT_TTL_MS: u64 = 5000;

/// Lifetime of the "data updated" notice after a silent refresh.
pub const SILENT_REFRESH_TTL_MS: u64 = 2000;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
    Warning,
}

/// One queued message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub kind: NotificationKind,
    pub created_at: DateTime<Utc>,
    pub ttl_ms: u64,
}

impl Notification {
    /// Instant after which the notification is gone, `None` if it persists.
    ///
    /// A TTL past the end of representable time also persists.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        if self.ttl_ms == 0 {
            return None;
        }
        let ttl = Duration::try_milliseconds(i64::try_from(self.ttl_ms).ok()?)?;
        self.created_at.checked_add_signed(ttl)
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|at| now >= at)
    }
}

/// Ordered queue of live notifications, oldest first.
#[derive(Debug, Clone, Default)]
pub struct NotificationQueue {
    items: Vec<Notification>,
    next_id: u64,
}

impl NotificationQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a notification and returns its id.
    pub fn push(
        &mut self,
        message: impl Into<String>,
        kind: NotificationKind,
        now: DateTime<Utc>,
        ttl_ms: u64,
    ) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        let message = message.into();
        tracing::debug!(id, ?kind, ttl_ms, %message, "notification queued");
        self.items.push(Notification {
            id,
            message,
            kind,
            created_at: now,
            ttl_ms,
        });
        id
    }

    /// Removes one notification. Returns `false` if it was already gone.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        before != self.items.len()
    }

    /// Drops every notification whose TTL has elapsed. Returns how many were dropped.
    pub fn expire(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.items.len();
        self.items.retain(|n| !n.is_expired(now));
        before - self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[must_use]
    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000 + ms).unwrap()
    }

    #[test]
    fn notifications_expire_after_ttl() {
        let mut queue = NotificationQueue::new();
        queue.push("saved", NotificationKind::Success, at(0), 5000);
        queue.push("refreshed", NotificationKind::Info, at(0), 2000);

        assert_eq!(queue.expire(at(1999)), 0);
        assert_eq!(queue.expire(at(2000)), 1);
        assert_eq!(queue.items()[0].message, "saved");
        assert_eq!(queue.expire(at(5000)), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn zero_ttl_persists_until_dismissed() {
        let mut queue = NotificationQueue::new();
        let id = queue.push("session expired", NotificationKind::Error, at(0), 0);
        assert_eq!(queue.expire(at(1_000_000)), 0);
        assert!(queue.dismiss(id));
        assert!(!queue.dismiss(id));
    }

    #[test]
    fn oversized_ttl_never_expires() {
        let mut queue = NotificationQueue::new();
        queue.push("forever", NotificationKind::Info, at(0), u64::MAX);
        queue.push("long", NotificationKind::Info, at(0), i64::MAX as u64);
        assert_eq!(queue.items()[0].expires_at(), None);
        assert_eq!(queue.items()[1].expires_at(), None);
        assert_eq!(queue.expire(DateTime::<Utc>::MAX_UTC), 0);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let mut queue = NotificationQueue::new();
        let a = queue.push("a", NotificationKind::Info, at(0), 10);
        let b = queue.push("b", NotificationKind::Info, at(0), 10);
        assert!(b > a);
    }
}
