use std::time::{Duration, Instant};

/// How long auto-dismissing notifications stay visible.
pub const AUTO_DISMISS: Duration = Duration::from_secs(4);

/// Visual category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

/// A single user-facing notification.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub title: String,
    pub message: Option<String>,
    /// `None` means the notification stays until dismissed.
    pub dismiss_after: Option<Duration>,
    pub created_at: Instant,
}

impl Notification {
    pub fn is_persistent(&self) -> bool {
        self.dismiss_after.is_none()
    }

    /// Whether an auto-dismissing notification has outlived its delay.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.dismiss_after
            .is_some_and(|after| now.saturating_duration_since(self.created_at) >= after)
    }
}

/// In-memory notification queue with monotonic ID assignment.
#[derive(Debug, Clone, Default)]
pub struct NotificationQueue {
    items: Vec<Notification>,
    next_id: u64,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a notification and returns its ID.
    pub fn push(
        &mut self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: Option<String>,
        dismiss_after: Option<Duration>,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.items.push(Notification {
            id,
            kind,
            title: title.into(),
            message,
            dismiss_after,
            created_at: Instant::now(),
        });
        id
    }

    /// Auto-dismissing success confirmation.
    pub fn success(&mut self, title: impl Into<String>, message: Option<String>) -> u64 {
        self.push(NotificationKind::Success, title, message, Some(AUTO_DISMISS))
    }

    /// Persistent failure notice.
    pub fn error(&mut self, title: impl Into<String>, message: Option<String>) -> u64 {
        self.push(NotificationKind::Error, title, message, None)
    }

    /// Persistent warning. Integrity warnings must never vanish on their own.
    pub fn warning(&mut self, title: impl Into<String>, message: Option<String>) -> u64 {
        self.push(NotificationKind::Warning, title, message, None)
    }

    /// Auto-dismissing informational notice.
    pub fn info(&mut self, title: impl Into<String>, message: Option<String>) -> u64 {
        self.push(NotificationKind::Info, title, message, Some(AUTO_DISMISS))
    }

    /// Removes a notification by ID. Returns `true` if it existed.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    /// Drops auto-dismissing notifications whose delay has passed.
    /// Returns how many were removed.
    pub fn expire(&mut self, now: Instant) -> usize {
        let before = self.items.len();
        self.items.retain(|n| !n.is_expired(now));
        before - self.items.len()
    }

    pub fn get(&self, id: u64) -> Option<&Notification> {
        self.items.iter().find(|n| n.id == id)
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_order_kept() {
        let mut q = NotificationQueue::new();
        let a = q.success("first", None);
        let b = q.error("second", None);
        let c = q.info("third", None);
        assert_eq!((a, b, c), (0, 1, 2));

        let titles: Vec<&str> = q.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[test]
    fn failures_and_warnings_are_persistent() {
        let mut q = NotificationQueue::new();
        let e = q.error("upload failed", Some("transfer failed: 403".into()));
        let w = q.warning("digest mismatch", None);
        let s = q.success("uploaded", None);

        assert!(q.get(e).unwrap().is_persistent());
        assert!(q.get(w).unwrap().is_persistent());
        assert_eq!(q.get(s).unwrap().dismiss_after, Some(AUTO_DISMISS));
        assert_eq!(q.get(e).unwrap().kind, NotificationKind::Error);
    }

    #[test]
    fn expire_only_removes_elapsed_auto_dismissing() {
        let mut q = NotificationQueue::new();
        let s = q.success("ok", None);
        let e = q.error("bad", None);

        let created = q.get(s).unwrap().created_at;
        assert_eq!(q.expire(created), 0);
        assert_eq!(q.expire(created + AUTO_DISMISS + Duration::from_secs(600)), 1);
        assert!(q.get(s).is_none());
        assert!(q.get(e).is_some());
    }

    #[test]
    fn dismiss_removes_by_id() {
        let mut q = NotificationQueue::new();
        let keep = q.success("keep", None);
        let gone = q.error("dismiss me", None);

        assert!(q.dismiss(gone));
        assert!(!q.dismiss(gone));
        assert!(q.get(keep).is_some());
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn clear_empties_queue() {
        let mut q = NotificationQueue::new();
        q.success("a", None);
        q.error("b", None);
        q.clear();
        assert!(q.is_empty());
    }
}
