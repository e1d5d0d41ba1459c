//! Batch coordinator: owns every task of one upload session.
//!
//! Pipelines run concurrently and report back through [`BatchShared::patch`],
//! which replaces a task record under a single write lock. Events,
//! notifications and the "all tasks terminal" edge are produced under the
//! same lock, so the signal fires exactly once per settlement and no task
//! event is ever observed after it.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use casevault_notifications::Notifier;
use casevault_protocol::DigestComparison;
use casevault_transfer::LocalFile;
use tokio::sync::{Notify, Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::admission::admit_files;
use crate::backend::EvidenceBackend;
use crate::error::{BatchError, TransitionError, UploadError};
use crate::pipeline;
use crate::task::{TaskId, TaskStatus, UploadTask};
use crate::types::{BatchConfig, BatchEvent, BatchSummary};

/// Called with the accepted files of every selection, even when empty.
pub type SelectCallback = Box<dyn Fn(&[LocalFile]) + Send + Sync>;

/// Called once each time the batch becomes fully terminal.
pub type SettledCallback = Box<dyn Fn(&BatchSummary) + Send + Sync>;

#[derive(Default)]
struct BatchState {
    tasks: Vec<UploadTask>,
    tokens: HashMap<TaskId, CancellationToken>,
    next_id: u64,
    /// Set when the all-terminal signal fired; cleared by new work.
    settled_fired: bool,
}

impl BatchState {
    fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id() == id)
    }

    /// Returns a summary if this call observes the transition into
    /// "all terminal". Later calls return `None` until re-armed.
    fn settle_edge(&mut self) -> Option<BatchSummary> {
        let summary = BatchSummary::of(&self.tasks);
        if summary.total == 0 || !summary.is_settled() {
            self.settled_fired = false;
            return None;
        }
        if self.settled_fired {
            return None;
        }
        self.settled_fired = true;
        Some(summary)
    }
}

#[derive(Default)]
struct Callbacks {
    on_select: Vec<SelectCallback>,
    on_settled: Vec<SettledCallback>,
}

/// State shared between the batch handle and its running pipelines.
pub(crate) struct BatchShared {
    pub(crate) config: BatchConfig,
    pub(crate) backend: Arc<dyn EvidenceBackend>,
    pub(crate) permits: Option<Arc<Semaphore>>,
    state: RwLock<BatchState>,
    callbacks: RwLock<Callbacks>,
    notifier: Notifier,
    events_tx: mpsc::UnboundedSender<BatchEvent>,
    settled: Notify,
}

impl BatchShared {
    fn read_state(&self) -> RwLockReadGuard<'_, BatchState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, BatchState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: BatchEvent) {
        // Nobody listening is fine.
        let _ = self.events_tx.send(event);
    }

    /// Applies `f` to a copy of task `id` and stores the copy back.
    ///
    /// If `f` fails the stored record is untouched. `f`, the status events,
    /// notifications and the settle check all run under the write lock;
    /// only the settled callbacks and waiters run after it is released.
    pub(crate) fn patch<R>(
        &self,
        id: TaskId,
        f: impl FnOnce(&mut UploadTask) -> Result<R, TransitionError>,
    ) -> Result<R, BatchError> {
        let (result, settled) = {
            let mut state = self.write_state();
            let index = state.position(id).ok_or(BatchError::TaskNotFound(id))?;
            let mut record = state.tasks[index].clone();
            let before = record.status();
            let result = f(&mut record)?;
            let changed = record.status() != before;
            state.tasks[index] = record;
            if !changed {
                return Ok(result);
            }
            self.on_status_change(&state.tasks[index]);
            let settled = state.settle_edge();
            if let Some(summary) = &settled {
                info!(done = summary.done, failed = summary.failed, "all uploads settled");
                self.emit(BatchEvent::AllTerminal {
                    done: summary.done,
                    failed: summary.failed,
                });
            }
            (result, settled)
        };

        if let Some(summary) = settled {
            self.on_settled(summary);
        }
        Ok(result)
    }

    fn on_status_change(&self, task: &UploadTask) {
        let id = task.id();
        self.emit(BatchEvent::StatusChanged {
            task_id: id,
            status: task.status(),
            progress: task.progress(),
        });

        match task.status() {
            TaskStatus::Done => {
                info!(task = %id, file = %task.display_name(), "upload complete");
                self.notifier.success(
                    "Upload complete",
                    Some(format!("{} was accepted", task.display_name())),
                );
                if task.digest_check() == DigestComparison::Mismatch {
                    warn!(
                        task = %id,
                        local = task.local_digest().unwrap_or_default(),
                        server = task.server_digest().unwrap_or_default(),
                        "server digest differs from local digest"
                    );
                    self.notifier.warning(
                        "Digest mismatch",
                        Some(format!(
                            "{}: server reported a different SHA-256",
                            task.display_name()
                        )),
                    );
                }
                self.emit(BatchEvent::Completed {
                    task_id: id,
                    evidence_id: task.remote_id().unwrap_or_default().to_string(),
                    digest: task.local_digest().map(str::to_string),
                });
            }
            TaskStatus::Error => {
                let message = task.error_message().unwrap_or_default().to_string();
                error!(task = %id, file = %task.display_name(), error = %message, "upload failed");
                self.notifier.error(
                    format!("Upload failed: {}", task.display_name()),
                    Some(message.clone()),
                );
                self.emit(BatchEvent::Failed {
                    task_id: id,
                    error: message,
                });
            }
            status => debug!(task = %id, %status, progress = task.progress(), "status changed"),
        }
    }

    /// Runs outside the state lock: callbacks may query the batch.
    fn on_settled(&self, summary: BatchSummary) {
        let callbacks = self.callbacks.read().unwrap_or_else(|e| e.into_inner());
        for cb in &callbacks.on_settled {
            cb(&summary);
        }
        drop(callbacks);
        self.settled.notify_waiters();
    }

    /// Progress callback target for the transfer stage.
    ///
    /// Ignored once the task is terminal (a cancelled write may still be
    /// reporting).
    pub(crate) fn report_transfer(&self, id: TaskId, sent: u64, total: u64) {
        let percent = self.config.checkpoints.transfer_percent(sent, total);
        let _ = self.patch(id, |task| {
            if task.status().is_terminal() {
                return Ok(());
            }
            task.raise_progress(percent);
            self.emit(BatchEvent::Progress {
                task_id: id,
                sent,
                total,
                progress: task.progress(),
            });
            Ok(())
        });
    }
}

/// Handle on one upload session.
///
/// Dropping the handle does not stop running pipelines; they hold their
/// own reference to the shared state and finish normally.
pub struct UploadBatch {
    shared: Arc<BatchShared>,
    events_rx: Option<mpsc::UnboundedReceiver<BatchEvent>>,
}

impl UploadBatch {
    pub fn new(config: BatchConfig, backend: Arc<dyn EvidenceBackend>, notifier: Notifier) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let permits = (config.max_concurrent > 0)
            .then(|| Arc::new(Semaphore::new(config.max_concurrent)));
        Self {
            shared: Arc::new(BatchShared {
                config,
                backend,
                permits,
                state: RwLock::new(BatchState::default()),
                callbacks: RwLock::new(Callbacks::default()),
                notifier,
                events_tx,
                settled: Notify::new(),
            }),
            events_rx: Some(events_rx),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<BatchEvent>> {
        self.events_rx.take()
    }

    pub fn config(&self) -> &BatchConfig {
        &self.shared.config
    }

    pub fn notifier(&self) -> &Notifier {
        &self.shared.notifier
    }

    /// Registers a callback run with the accepted files of each selection.
    pub fn on_select(&self, cb: impl Fn(&[LocalFile]) + Send + Sync + 'static) {
        self.shared
            .callbacks
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .on_select
            .push(Box::new(cb));
    }

    /// Registers a callback run each time every task becomes terminal.
    pub fn on_settled(&self, cb: impl Fn(&BatchSummary) + Send + Sync + 'static) {
        self.shared
            .callbacks
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .on_settled
            .push(Box::new(cb));
    }

    /// Filters a selection and starts a pipeline for each accepted file.
    ///
    /// Must be called inside a tokio runtime. Returns the new task ids in
    /// selection order.
    pub fn admit(&self, files: Vec<LocalFile>) -> Vec<TaskId> {
        let config = &self.shared.config;
        let admission = admit_files(files, &config.accept, config.max_files);
        if !admission.rejected.is_empty() {
            info!(
                accepted = admission.accepted.len(),
                rejected = admission.rejected.len(),
                "selection filtered"
            );
        }

        {
            let callbacks = self.shared.callbacks.read().unwrap_or_else(|e| e.into_inner());
            for cb in &callbacks.on_select {
                cb(&admission.accepted);
            }
        }

        admission
            .accepted
            .into_iter()
            .map(|file| self.spawn_task(file, None))
            .collect()
    }

    fn spawn_task(&self, file: LocalFile, retry_of: Option<TaskId>) -> TaskId {
        let cancel = CancellationToken::new();
        let id = {
            let mut state = self.shared.write_state();
            let id = TaskId(state.next_id);
            state.next_id += 1;
            let task = UploadTask::new(id, file.clone(), retry_of);
            let name = task.display_name().to_string();
            state.tasks.push(task);
            state.tokens.insert(id, cancel.clone());
            state.settled_fired = false;
            debug!(task = %id, file = %name, ?retry_of, "task admitted");
            self.shared.emit(BatchEvent::Admitted { task_id: id, name });
            id
        };

        tokio::spawn(pipeline::run(Arc::clone(&self.shared), id, file, cancel));
        id
    }

    /// Copy of every task, in admission order.
    pub fn tasks(&self) -> Vec<UploadTask> {
        self.shared.read_state().tasks.clone()
    }

    pub fn task(&self, id: TaskId) -> Option<UploadTask> {
        let state = self.shared.read_state();
        state.position(id).map(|i| state.tasks[i].clone())
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary::of(&self.shared.read_state().tasks)
    }

    /// Every task terminal. Querying never fires the settled signal.
    pub fn is_settled(&self) -> bool {
        self.summary().is_settled()
    }

    /// Waits until every task is terminal and returns the summary.
    pub async fn wait_settled(&self) -> BatchSummary {
        loop {
            let notified = self.shared.settled.notified();
            let summary = self.summary();
            if summary.is_settled() {
                return summary;
            }
            notified.await;
        }
    }

    /// Re-admits the file of a failed task as a new task.
    ///
    /// The failed task stays in the batch unchanged.
    pub fn retry(&self, id: TaskId) -> Result<TaskId, BatchError> {
        let file = {
            let state = self.shared.read_state();
            let task = state
                .position(id)
                .map(|i| &state.tasks[i])
                .ok_or(BatchError::TaskNotFound(id))?;
            if task.status() != TaskStatus::Error {
                return Err(BatchError::NotRetryable(id));
            }
            task.file().clone()
        };
        info!(task = %id, "retrying upload");
        Ok(self.spawn_task(file, Some(id)))
    }

    /// Cancels a task. Returns `false` if it was already terminal or is
    /// reconciling.
    ///
    /// A reconciling task has handed its bytes to the server, which decides
    /// the outcome; it is left to finish. Otherwise the task moves to
    /// `error` immediately and its pipeline stops at the next await point.
    pub fn cancel(&self, id: TaskId) -> Result<bool, BatchError> {
        let cancelled = self.shared.patch(id, |task| {
            if task.status().is_terminal() || task.status() == TaskStatus::Reconciling {
                return Ok(false);
            }
            task.fail(UploadError::Cancelled.to_string())?;
            Ok(true)
        })?;

        if cancelled {
            warn!(task = %id, "upload cancelled");
            if let Some(token) = self.shared.read_state().tokens.get(&id) {
                token.cancel();
            }
        }
        Ok(cancelled)
    }

    /// Cancels every unfinished task that is not reconciling. Returns how
    /// many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let ids: Vec<TaskId> = self
            .shared
            .read_state()
            .tasks
            .iter()
            .filter(|t| !t.status().is_terminal())
            .map(UploadTask::id)
            .collect();
        ids.into_iter()
            .filter(|id| matches!(self.cancel(*id), Ok(true)))
            .count()
    }

    /// Removes every task. Refused while any task is unfinished.
    pub fn clear(&self) -> Result<usize, BatchError> {
        let mut state = self.shared.write_state();
        let unfinished = state
            .tasks
            .iter()
            .filter(|t| !t.status().is_terminal())
            .count();
        if unfinished > 0 {
            return Err(BatchError::Busy { active: unfinished });
        }
        let removed = state.tasks.len();
        state.tasks.clear();
        state.tokens.clear();
        state.settled_fired = false;
        debug!(removed, "batch cleared");
        Ok(removed)
    }
}
