//! Notification queue for upload outcomes.
//!
//! Failures and integrity warnings stay until the user dismisses them.
//! Confirmations carry an auto-dismiss delay; expiring them is driven by
//! whoever renders the queue.

mod notifier;
mod queue;

pub use notifier::Notifier;
pub use queue::{Notification, NotificationKind, NotificationQueue};
