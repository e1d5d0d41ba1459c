//! Backend trait used by the upload pipeline.
//!
//! `EvidenceBackend` is implemented by the application on top of its HTTP
//! client. Keeping the pipeline behind a trait decouples it from transport
//! and makes it testable with in-memory mocks.

use std::future::Future;
use std::pin::Pin;
use bytes::Bytes;
use casevault_protocol::{CompleteUploadResponse, NegotiateUploadRequest, NegotiateUploadResponse};
pub use casevault_transfer::ProgressFn;

use crate::error::BackendError;

/// Boxed future returned by backend calls.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BackendError>> + Send + 'a>>;

/// The three network operations of one upload.
pub trait EvidenceBackend: Send + Sync {
    /// Obtains a record id and a pre-authorized write destination.
    fn negotiate(
        &self,
        case_id: &str,
        request: &NegotiateUploadRequest,
    ) -> BackendFuture<'_, NegotiateUploadResponse>;

    /// Writes the complete content to `destination`, reporting progress.
    ///
    /// Any non-success answer from the destination is an error. No retries.
    fn write(
        &self,
        destination: &str,
        data: Bytes,
        content_type: &str,
        progress: ProgressFn,
    ) -> BackendFuture<'_, ()>;

    /// Signals that the transfer finished and returns the server verdict.
    fn complete(&self, evidence_id: &str) -> BackendFuture<'_, CompleteUploadResponse>;
}
