//! Evidence upload pipeline.
//!
//! This crate implements the client-side **business logic** of uploading
//! evidence files to a case. It has no transport dependency: the
//! application provides an [`EvidenceBackend`] that bridges to the actual
//! HTTP client.
//!
//! # Pipeline
//!
//! Each admitted file becomes an [`UploadTask`] and runs independently:
//!
//! 1. **Hash**: read the file and compute its SHA-256 locally
//! 2. **Negotiate**: ask the backend for a record id and a write destination
//! 3. **Transfer**: stream the bytes straight to that destination
//! 4. **Reconcile**: report completion; the server accepts or rejects
//!
//! An [`UploadBatch`] admits selections, bounds concurrency, publishes
//! [`BatchEvent`]s and raises a single signal when every task has settled.

pub mod admission;
pub mod backend;
pub mod batch;
pub mod error;
mod pipeline;
pub mod task;
pub mod types;

#[cfg(test)]
mod mock;

pub use admission::{AcceptFilter, Admission, RejectReason, admit_files};
pub use backend::{BackendFuture, EvidenceBackend, ProgressFn};
pub use batch::{SelectCallback, SettledCallback, UploadBatch};
pub use error::{BackendError, BatchError, TransitionError, UploadError};
pub use task::{TaskId, TaskStatus, UploadTask};
pub use types::{BatchConfig, BatchEvent, BatchSummary};
