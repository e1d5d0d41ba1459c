//! In-memory backend shared by the crate's tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use casevault_protocol::{CompleteUploadResponse, NegotiateUploadRequest, NegotiateUploadResponse};
use casevault_transfer::checksum_bytes;
use tokio::sync::Semaphore;

use crate::backend::{BackendFuture, EvidenceBackend, ProgressFn};
use crate::error::BackendError;

/// Which call a scripted failure applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Negotiate,
    Write,
    Complete,
}

#[derive(Default)]
struct Script {
    failures: HashMap<(String, Stage), BackendError>,
    rejections: HashMap<String, String>,
    reported_digests: HashMap<String, String>,
}

/// Records every call; failures and verdicts are scripted per filename.
///
/// Evidence ids are `ev-<filename>`, destinations `mem://<filename>`.
/// By default completion reports the digest of the bytes written.
#[derive(Default)]
pub struct MockBackend {
    script: Mutex<Script>,
    calls: Mutex<Vec<(Stage, String)>>,
    written: Mutex<HashMap<String, Bytes>>,
    gate: Option<(Stage, Arc<Semaphore>)>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write waits for a permit on the returned semaphore.
    pub fn gated() -> (Self, Arc<Semaphore>) {
        Self::gated_at(Stage::Write)
    }

    /// Every call of `stage` waits for a permit on the returned semaphore.
    pub fn gated_at(stage: Stage) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let backend = Self {
            gate: Some((stage, Arc::clone(&gate))),
            ..Self::default()
        };
        (backend, gate)
    }

    pub fn fail(self, filename: &str, stage: Stage, error: BackendError) -> Self {
        self.script
            .lock()
            .unwrap()
            .failures
            .insert((filename.to_string(), stage), error);
        self
    }

    pub fn reject(self, filename: &str, detail: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .rejections
            .insert(filename.to_string(), detail.to_string());
        self
    }

    pub fn report_digest(self, filename: &str, digest: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .reported_digests
            .insert(filename.to_string(), digest.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(Stage, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, stage: Stage) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(s, _)| *s == stage)
            .map(|(_, name)| name)
            .collect()
    }

    pub fn written(&self, filename: &str) -> Option<Bytes> {
        self.written.lock().unwrap().get(filename).cloned()
    }

    fn record(&self, stage: Stage, filename: &str) -> Result<(), BackendError> {
        self.calls
            .lock()
            .unwrap()
            .push((stage, filename.to_string()));
        match self
            .script
            .lock()
            .unwrap()
            .failures
            .get(&(filename.to_string(), stage))
        {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn pass_gate(&self, stage: Stage) -> Result<(), BackendError> {
        let Some((gated, gate)) = &self.gate else {
            return Ok(());
        };
        if *gated == stage {
            gate.acquire()
                .await
                .map_err(|e| BackendError::Other(e.to_string()))?
                .forget();
        }
        Ok(())
    }
}

impl EvidenceBackend for MockBackend {
    fn negotiate(
        &self,
        _case_id: &str,
        request: &NegotiateUploadRequest,
    ) -> BackendFuture<'_, NegotiateUploadResponse> {
        let name = request.filename.clone();
        Box::pin(async move {
            self.record(Stage::Negotiate, &name)?;
            Ok(NegotiateUploadResponse {
                evidence_id: format!("ev-{name}"),
                upload_url: format!("mem://{name}"),
                expires_at: None,
            })
        })
    }

    fn write(
        &self,
        destination: &str,
        data: Bytes,
        _content_type: &str,
        progress: ProgressFn,
    ) -> BackendFuture<'_, ()> {
        let name = destination.trim_start_matches("mem://").to_string();
        Box::pin(async move {
            self.record(Stage::Write, &name)?;
            self.pass_gate(Stage::Write).await?;
            let total = data.len() as u64;
            progress(total / 2, total);
            progress(total, total);
            self.written.lock().unwrap().insert(name, data);
            Ok(())
        })
    }

    fn complete(&self, evidence_id: &str) -> BackendFuture<'_, CompleteUploadResponse> {
        let name = evidence_id.trim_start_matches("ev-").to_string();
        Box::pin(async move {
            self.record(Stage::Complete, &name)?;
            self.pass_gate(Stage::Complete).await?;
            let script = self.script.lock().unwrap();
            if let Some(detail) = script.rejections.get(&name) {
                return Ok(CompleteUploadResponse {
                    accepted: false,
                    sha256: None,
                    detail: Some(detail.clone()),
                });
            }
            let sha256 = script.reported_digests.get(&name).cloned().or_else(|| {
                self.written
                    .lock()
                    .unwrap()
                    .get(&name)
                    .map(|data| checksum_bytes(data))
            });
            Ok(CompleteUploadResponse {
                accepted: true,
                sha256,
                detail: None,
            })
        })
    }
}
