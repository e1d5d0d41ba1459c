//! Evidence API client.

use std::time::Duration;

use bytes::Bytes;
use casevault_protocol::{
    AuditReplayResult, CompleteUploadResponse, Manifest, ManifestVerification,
    NegotiateUploadRequest, NegotiateUploadResponse,
};
use casevault_transfer::{ChunkSplitter, ProgressFn};
use futures_util::StreamExt;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Characters escaped in path segments; unreserved URL characters stay.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Errors from the evidence API client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Evidence API client.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    chunk_size: usize,
}

impl Client {
    /// Creates a client for the API rooted at `base_url`.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, Error> {
        let parsed =
            reqwest::Url::parse(base_url).map_err(|e| Error::InvalidUrl(format!("{base_url}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(Error::InvalidUrl(base_url.to_string()));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            chunk_size: casevault_transfer::DEFAULT_CHUNK_SIZE,
        })
    }

    /// Sets the chunk size used to report direct-write progress.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POSTs an optional JSON body and decodes a JSON response.
    async fn post_json<B, T>(&self, url: &str, body: Option<&B>) -> Result<T, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut req = self.http.post(url);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Asks the backend for a write destination for one file of a case.
    pub async fn negotiate_upload(
        &self,
        case_id: &str,
        req: &NegotiateUploadRequest,
    ) -> Result<NegotiateUploadResponse, Error> {
        let url = self.endpoint(&format!(
            "/api/cases/{}/evidence/upload-url",
            encode_segment(case_id)
        ));
        debug!(case = %case_id, file = %req.filename, size = req.size, "negotiating upload");
        self.post_json(&url, Some(req)).await
    }

    /// Writes `data` directly to a presigned destination.
    ///
    /// The body is streamed in chunks; `progress` is called each time a
    /// chunk is handed to the transport. Any non-2xx answer is a failure.
    /// No retries happen here.
    pub async fn put_object(
        &self,
        upload_url: &str,
        data: Bytes,
        content_type: &str,
        progress: Option<ProgressFn>,
    ) -> Result<(), Error> {
        let url = reqwest::Url::parse(upload_url)
            .map_err(|e| Error::InvalidUrl(format!("{upload_url}: {e}")))?;
        let total = data.len() as u64;

        let stream = futures_util::stream::iter(ChunkSplitter::new(data, self.chunk_size)).map(
            move |chunk| {
                if let Some(progress) = &progress {
                    progress(chunk.end(), total);
                }
                Ok::<Bytes, std::io::Error>(chunk.data)
            },
        );

        let resp = self
            .http
            .put(url)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, total)
            .body(reqwest::Body::wrap_stream(stream))
            .send()
            .await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        debug!(bytes = total, "direct write accepted");
        Ok(())
    }

    /// Tells the backend the transfer finished; returns its integrity verdict.
    pub async fn complete_upload(&self, evidence_id: &str) -> Result<CompleteUploadResponse, Error> {
        let url = self.endpoint(&format!(
            "/api/evidence/{}/complete",
            encode_segment(evidence_id)
        ));
        self.post_json::<(), _>(&url, None).await
    }

    /// Submits a manifest for server-side SHA-256 and HMAC verification.
    pub async fn verify_manifest(&self, manifest: &Manifest) -> Result<ManifestVerification, Error> {
        let url = self.endpoint("/api/verify/manifest");
        self.post_json(&url, Some(manifest)).await
    }

    /// Replays a case's audit log on the server and returns any mismatches.
    pub async fn audit_replay(&self, case_id: &str) -> Result<AuditReplayResult, Error> {
        let url = self.endpoint(&format!(
            "/api/cases/{}/audit/replay",
            encode_segment(case_id)
        ));
        self.post_json::<(), _>(&url, None).await
    }
}

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}
