//! Evidence manifests, verification results and audit replay reports.
//!
//! These checks are server-authoritative; the client only parses the
//! manifest enough to reject malformed input before sending it.

use serde::{Deserialize, Serialize};

/// Errors produced while reading a manifest document.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The document is not valid JSON or lacks required fields.
    #[error("invalid manifest format: {0}")]
    InvalidFormat(#[from] serde_json::Error),
}

/// One evidence item listed in a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceDescriptor {
    pub evidence_id: String,
    pub filename: String,
    pub sha256: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A case manifest as exported by the backend.
///
/// Unknown fields are kept in `extra` so the document round-trips intact
/// when forwarded for verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub case_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub evidence: Vec<EvidenceDescriptor>,
    pub manifest_sha256: String,
    pub manifest_hmac: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Manifest {
    /// Parses a manifest from JSON text.
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Result of `POST /api/verify/manifest`.
///
/// The two flags are independent: a manifest can have an intact digest
/// but a forged HMAC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestVerification {
    pub sha256_valid: bool,
    pub hmac_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ManifestVerification {
    /// Returns `true` only if both checks passed.
    pub fn is_valid(&self) -> bool {
        self.sha256_valid && self.hmac_valid
    }
}

/// A hash mismatch found while replaying a case's audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditMismatch {
    pub evidence_id: String,
    pub expected_sha256: String,
    pub actual_sha256: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Result of `POST /api/cases/{case_id}/audit/replay`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReplayResult {
    pub case_id: String,
    pub events_checked: u64,
    pub evidence_checked: u64,
    #[serde(default)]
    pub mismatches: Vec<AuditMismatch>,
}

impl AuditReplayResult {
    /// Returns `true` if the replay found no mismatches.
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }
}
