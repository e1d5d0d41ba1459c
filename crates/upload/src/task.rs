//! Per-file upload task and its state machine.

use std::fmt;

use casevault_protocol::DigestComparison;
use casevault_transfer::{LocalFile, StageCheckpoints, sanitize_filename};

use crate::error::TransitionError;

/// Identifies a task within its batch. Never reused, even after a clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Pipeline status of one task.
///
/// ```text
/// queued -> hashing -> negotiating -> transferring -> reconciling -> done
///    \_________\___________\______________\______________\_____-> error
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Queued,
    Hashing,
    Negotiating,
    Transferring,
    Reconciling,
    Done,
    Error,
}

impl TaskStatus {
    /// The next status on the success path, `None` for terminal states.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Queued => Some(Self::Hashing),
            Self::Hashing => Some(Self::Negotiating),
            Self::Negotiating => Some(Self::Transferring),
            Self::Transferring => Some(Self::Reconciling),
            Self::Reconciling => Some(Self::Done),
            Self::Done | Self::Error => None,
        }
    }

    /// `done` and `error` are terminal; nothing leaves them.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    /// Whether `self -> to` is a legal transition.
    pub fn can_transition_to(self, to: Self) -> bool {
        if to == Self::Error {
            return !self.is_terminal();
        }
        self.next() == Some(to)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Hashing => "hashing",
            Self::Negotiating => "negotiating",
            Self::Transferring => "transferring",
            Self::Reconciling => "reconciling",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file's upload attempt.
///
/// Fields are read through accessors; only the batch mutates a task, and
/// only by replacing the whole record.
#[derive(Debug, Clone)]
pub struct UploadTask {
    id: TaskId,
    file: LocalFile,
    display_name: String,
    status: TaskStatus,
    progress: u8,
    local_digest: Option<String>,
    remote_id: Option<String>,
    server_digest: Option<String>,
    digest_check: DigestComparison,
    error_message: Option<String>,
    retry_of: Option<TaskId>,
}

impl UploadTask {
    pub(crate) fn new(id: TaskId, file: LocalFile, retry_of: Option<TaskId>) -> Self {
        let display_name = sanitize_filename(file.name());
        Self {
            id,
            file,
            display_name,
            status: TaskStatus::Queued,
            progress: 0,
            local_digest: None,
            remote_id: None,
            server_digest: None,
            digest_check: DigestComparison::Unavailable,
            error_message: None,
            retry_of,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn file(&self) -> &LocalFile {
        &self.file
    }

    /// Sanitized name, used for display and sent to the backend.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Percentage 0-100. Frozen once the task fails.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Hex SHA-256 computed before any network call.
    pub fn local_digest(&self) -> Option<&str> {
        self.local_digest.as_deref()
    }

    /// Evidence record id assigned during negotiation.
    pub fn remote_id(&self) -> Option<&str> {
        self.remote_id.as_deref()
    }

    /// Digest the server reported at reconciliation, if any.
    pub fn server_digest(&self) -> Option<&str> {
        self.server_digest.as_deref()
    }

    pub fn digest_check(&self) -> DigestComparison {
        self.digest_check
    }

    /// Present only in [`TaskStatus::Error`].
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// The failed task this one re-admits, if it is a retry.
    pub fn retry_of(&self) -> Option<TaskId> {
        self.retry_of
    }

    pub(crate) fn advance(&mut self, to: TaskStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(to) {
            return Err(TransitionError {
                task_id: self.id,
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Raises progress; never lowers it. Below 100 until the task is done.
    pub(crate) fn raise_progress(&mut self, percent: u8) {
        if self.status.is_terminal() {
            return;
        }
        let capped = percent.min(StageCheckpoints::DONE - 1);
        self.progress = self.progress.max(capped);
    }

    /// Set once; later calls are ignored.
    pub(crate) fn record_digest(&mut self, digest: String) {
        if self.local_digest.is_none() {
            self.local_digest = Some(digest);
        }
    }

    /// Set once; later calls are ignored.
    pub(crate) fn record_remote_id(&mut self, remote_id: String) {
        if self.remote_id.is_none() {
            self.remote_id = Some(remote_id);
        }
    }

    /// Moves `reconciling -> done` and compares digests.
    pub(crate) fn complete(
        &mut self,
        server_digest: Option<String>,
    ) -> Result<DigestComparison, TransitionError> {
        self.advance(TaskStatus::Done)?;
        self.progress = StageCheckpoints::DONE;
        self.digest_check =
            DigestComparison::compare(self.local_digest.as_deref(), server_digest.as_deref());
        self.server_digest = server_digest;
        Ok(self.digest_check)
    }

    /// Moves any non-terminal status to `error`.
    pub(crate) fn fail(&mut self, message: impl Into<String>) -> Result<(), TransitionError> {
        self.advance(TaskStatus::Error)?;
        self.error_message = Some(message.into());
        Ok(())
    }
}
