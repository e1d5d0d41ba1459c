//! Per-task pipeline: hash, negotiate, transfer, reconcile.
//!
//! Each admitted file runs this flow in its own tokio task. Every stage
//! boundary goes through [`BatchShared::patch`] so the batch sees whole
//! record replacements only.

use std::future::Future;
use std::sync::Arc;

use casevault_protocol::{IntegrityOutcome, NegotiateUploadRequest};
use casevault_transfer::{LocalFile, hash_local_file};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::backend::ProgressFn;
use crate::batch::BatchShared;
use crate::error::{BatchError, UploadError};
use crate::task::{TaskId, TaskStatus};

/// Why a pipeline stopped early.
enum Stop {
    /// The task failed and must be moved to `error`.
    Failed(UploadError),
    /// The batch refused a patch: the task was cancelled or cleared.
    Detached(BatchError),
}

impl From<UploadError> for Stop {
    fn from(e: UploadError) -> Self {
        Self::Failed(e)
    }
}

impl From<BatchError> for Stop {
    fn from(e: BatchError) -> Self {
        Self::Detached(e)
    }
}

/// Runs one task to a terminal state.
pub(crate) async fn run(
    shared: Arc<BatchShared>,
    id: TaskId,
    file: LocalFile,
    cancel: CancellationToken,
) {
    match drive(&shared, id, &file, &cancel).await {
        Ok(()) => {}
        Err(Stop::Failed(err)) => {
            let message = err.to_string();
            if let Err(e) = shared.patch(id, |task| task.fail(message)) {
                debug!(task = %id, error = %e, "failure not recorded, task already settled");
            }
        }
        Err(Stop::Detached(e)) => {
            debug!(task = %id, error = %e, "pipeline detached");
        }
    }
}

/// Awaits `fut` unless the task is cancelled first.
///
/// Cancellation is checked before `fut` is polled, so a stage never starts
/// once the token fired.
async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, UploadError>
where
    F: Future<Output = Result<T, UploadError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(UploadError::Cancelled),
        result = fut => result,
    }
}

async fn drive(
    shared: &Arc<BatchShared>,
    id: TaskId,
    file: &LocalFile,
    cancel: &CancellationToken,
) -> Result<(), Stop> {
    let checkpoints = shared.config.checkpoints;

    // Held until the task settles; bounds pipelines past `queued`.
    let _permit = match &shared.permits {
        Some(permits) => Some(
            cancellable(cancel, async {
                Arc::clone(permits)
                    .acquire_owned()
                    .await
                    .map_err(|_| UploadError::Cancelled)
            })
            .await?,
        ),
        None => None,
    };

    // Hashing: the digest exists before any network call.
    shared.patch(id, |task| task.advance(TaskStatus::Hashing))?;
    debug!(task = %id, file = %file.name(), size = file.size(), "hashing");
    let hashed = cancellable(cancel, async {
        hash_local_file(file).await.map_err(UploadError::Hash)
    })
    .await?;
    let display_name = shared.patch(id, |task| {
        task.record_digest(hashed.digest.clone());
        task.raise_progress(checkpoints.hashed);
        task.advance(TaskStatus::Negotiating)?;
        Ok(task.display_name().to_string())
    })?;

    // Negotiating: declared size is the selected file's size.
    let request = NegotiateUploadRequest {
        filename: display_name,
        content_type: file.content_type().to_string(),
        size: file.size(),
    };
    let destination = cancellable(cancel, async {
        shared
            .backend
            .negotiate(&shared.config.case_id, &request)
            .await
            .map_err(UploadError::Negotiate)
    })
    .await?;
    debug!(task = %id, evidence_id = %destination.evidence_id, "upload negotiated");
    shared.patch(id, |task| {
        task.record_remote_id(destination.evidence_id.clone());
        task.raise_progress(checkpoints.negotiated);
        task.advance(TaskStatus::Transferring)
    })?;

    // Transferring: bytes go straight to the destination.
    let progress: ProgressFn = {
        let shared = Arc::clone(shared);
        Arc::new(move |sent, total| shared.report_transfer(id, sent, total))
    };
    cancellable(cancel, async {
        shared
            .backend
            .write(
                &destination.upload_url,
                hashed.data.clone(),
                file.content_type(),
                progress,
            )
            .await
            .map_err(UploadError::Transfer)
    })
    .await?;
    shared.patch(id, |task| {
        task.raise_progress(checkpoints.transferred);
        task.advance(TaskStatus::Reconciling)
    })?;

    // Reconciling: the server verdict is authoritative.
    let response = cancellable(cancel, async {
        shared
            .backend
            .complete(&destination.evidence_id)
            .await
            .map_err(UploadError::Reconcile)
    })
    .await?;
    match response.outcome() {
        IntegrityOutcome::Accepted { server_digest } => {
            let check = shared.patch(id, |task| task.complete(server_digest))?;
            info!(task = %id, evidence_id = %destination.evidence_id, digest_check = ?check, "upload reconciled");
            Ok(())
        }
        IntegrityOutcome::Rejected { detail } => Err(UploadError::Rejected(detail).into()),
    }
}
