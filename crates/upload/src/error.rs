//! Upload error types.

use crate::task::{TaskId, TaskStatus};

/// Failure reported by an [`EvidenceBackend`](crate::EvidenceBackend).
///
/// Transport failures and business-rule rejections both end up here so
/// the task error state has one shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    #[error("rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("{0}")]
    Other(String),
}

/// Errors that end a single task's pipeline.
///
/// The `Display` text names the failing stage; it becomes the task's
/// error message.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("hashing failed: {0}")]
    Hash(#[from] casevault_transfer::TransferError),

    #[error("negotiation failed: {0}")]
    Negotiate(#[source] BackendError),

    #[error("transfer failed: {0}")]
    Transfer(#[source] BackendError),

    #[error("reconciliation failed: {0}")]
    Reconcile(#[source] BackendError),

    #[error("upload rejected by server: {0}")]
    Rejected(String),

    #[error("upload cancelled")]
    Cancelled,
}

/// A status change the state machine does not allow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("task {task_id}: illegal transition {from} -> {to}")]
pub struct TransitionError {
    pub task_id: TaskId,
    pub from: TaskStatus,
    pub to: TaskStatus,
}

/// Errors from batch-level operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    #[error("task {0} not found")]
    TaskNotFound(TaskId),

    #[error("task {0} has not failed and cannot be retried")]
    NotRetryable(TaskId),

    #[error("batch still has {active} unfinished task(s)")]
    Busy { active: usize },

    #[error(transparent)]
    Transition(#[from] TransitionError),
}
