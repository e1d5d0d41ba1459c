use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use crate::queue::{Notification, NotificationQueue};

/// Cloneable handle on a shared [`NotificationQueue`].
///
/// Producers (upload pipelines) and the view rendering notifications hold
/// clones of the same handle.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    queue: Arc<Mutex<NotificationQueue>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, NotificationQueue> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn success(&self, title: impl Into<String>, message: Option<String>) -> u64 {
        self.lock().success(title, message)
    }

    pub fn error(&self, title: impl Into<String>, message: Option<String>) -> u64 {
        self.lock().error(title, message)
    }

    pub fn warning(&self, title: impl Into<String>, message: Option<String>) -> u64 {
        self.lock().warning(title, message)
    }

    pub fn info(&self, title: impl Into<String>, message: Option<String>) -> u64 {
        self.lock().info(title, message)
    }

    pub fn dismiss(&self, id: u64) -> bool {
        self.lock().dismiss(id)
    }

    pub fn expire(&self, now: Instant) -> usize {
        self.lock().expire(now)
    }

    /// Copy of the current notifications, oldest first.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
