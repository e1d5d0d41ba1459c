//! Data types for the upload flow.

use casevault_transfer::StageCheckpoints;

use crate::admission::AcceptFilter;
use crate::task::{TaskId, TaskStatus, UploadTask};

/// Settings for one upload batch.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Case the evidence is filed under.
    pub case_id: String,
    pub accept: AcceptFilter,
    /// Per-selection file limit; 0 means unlimited.
    pub max_files: usize,
    /// Pipelines allowed past `queued` at once; 0 means unlimited.
    pub max_concurrent: usize,
    pub checkpoints: StageCheckpoints,
}

impl BatchConfig {
    /// Accepts any file, no limits, default checkpoints.
    pub fn new(case_id: impl Into<String>) -> Self {
        Self {
            case_id: case_id.into(),
            accept: AcceptFilter::any(),
            max_files: 0,
            max_concurrent: 0,
            checkpoints: StageCheckpoints::default(),
        }
    }
}

/// Event published by a batch while its tasks run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    /// A file passed admission and became a queued task.
    Admitted { task_id: TaskId, name: String },
    /// A task entered a new status.
    StatusChanged {
        task_id: TaskId,
        status: TaskStatus,
        progress: u8,
    },
    /// Bytes handed to the destination during transfer.
    Progress {
        task_id: TaskId,
        sent: u64,
        total: u64,
        progress: u8,
    },
    /// The server accepted the upload.
    Completed {
        task_id: TaskId,
        evidence_id: String,
        digest: Option<String>,
    },
    /// The task ended in `error`.
    Failed { task_id: TaskId, error: String },
    /// Every task in the batch is terminal. Sent once per settlement.
    AllTerminal { done: usize, failed: usize },
}

/// Aggregate view over a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub queued: usize,
    pub active: usize,
    pub done: usize,
    pub failed: usize,
    /// Mean task progress, 0 for an empty batch.
    pub progress: u8,
}

impl BatchSummary {
    pub fn of(tasks: &[UploadTask]) -> Self {
        let mut summary = Self {
            total: tasks.len(),
            ..Self::default()
        };
        let mut progress_sum: u64 = 0;
        for task in tasks {
            progress_sum += u64::from(task.progress());
            match task.status() {
                TaskStatus::Queued => summary.queued += 1,
                TaskStatus::Done => summary.done += 1,
                TaskStatus::Error => summary.failed += 1,
                _ => summary.active += 1,
            }
        }
        if !tasks.is_empty() {
            summary.progress = (progress_sum / tasks.len() as u64) as u8;
        }
        summary
    }

    /// Number of tasks in `done` or `error`.
    pub fn terminal(&self) -> usize {
        self.done + self.failed
    }

    /// All tasks terminal (vacuously true when empty).
    pub fn is_settled(&self) -> bool {
        self.terminal() == self.total
    }
}
