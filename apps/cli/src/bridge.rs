//! Adapter bridging the HTTP `Client` to the `EvidenceBackend` trait
//! required by the upload pipeline.

use bytes::Bytes;
use casevault_api::{Client, Error as ApiError};
use casevault_protocol::{CompleteUploadResponse, NegotiateUploadRequest, NegotiateUploadResponse};
use casevault_upload::{BackendError, BackendFuture, EvidenceBackend, ProgressFn};

/// Implements `EvidenceBackend` by delegating to the evidence API client.
pub struct ApiBackend {
    client: Client,
}

impl ApiBackend {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Transport failures and API rejections become one error shape.
fn backend_error(e: ApiError) -> BackendError {
    match e {
        ApiError::Http(e) => BackendError::Unreachable(e.to_string()),
        ApiError::Api { status, body } => BackendError::Rejected {
            status,
            message: if body.is_empty() {
                "no details".into()
            } else {
                body
            },
        },
        other => BackendError::Other(other.to_string()),
    }
}

impl EvidenceBackend for ApiBackend {
    fn negotiate(
        &self,
        case_id: &str,
        request: &NegotiateUploadRequest,
    ) -> BackendFuture<'_, NegotiateUploadResponse> {
        let case_id = case_id.to_string();
        let request = request.clone();
        Box::pin(async move {
            self.client
                .negotiate_upload(&case_id, &request)
                .await
                .map_err(backend_error)
        })
    }

    fn write(
        &self,
        destination: &str,
        data: Bytes,
        content_type: &str,
        progress: ProgressFn,
    ) -> BackendFuture<'_, ()> {
        let destination = destination.to_string();
        let content_type = content_type.to_string();
        Box::pin(async move {
            self.client
                .put_object(&destination, data, &content_type, Some(progress))
                .await
                .map_err(backend_error)
        })
    }

    fn complete(&self, evidence_id: &str) -> BackendFuture<'_, CompleteUploadResponse> {
        let evidence_id = evidence_id.to_string();
        Box::pin(async move {
            self.client
                .complete_upload(&evidence_id)
                .await
                .map_err(backend_error)
        })
    }
}
