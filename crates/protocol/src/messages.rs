use serde::{Deserialize, Serialize};

use crate::types::IntegrityOutcome;

// ---------------------------------------------------------------------------
// Upload negotiation
// ---------------------------------------------------------------------------

/// Asks the backend for a write destination for one file.
///
/// Sent as `POST /api/cases/{case_id}/evidence/upload-url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiateUploadRequest {
    pub filename: String,
    pub content_type: String,
    pub size: u64,
}

/// Destination handed back by the backend.
///
/// `upload_url` is pre-authorized and time-limited; bytes are written to it
/// directly without further backend mediation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiateUploadResponse {
    pub evidence_id: String,
    pub upload_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

/// Result of `POST /api/evidence/{evidence_id}/complete`.
///
/// The server recomputes the content hash over what it received; `sha256`
/// carries that digest when the backend chooses to return it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteUploadResponse {
    pub accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CompleteUploadResponse {
    /// Converts the raw response into an outcome.
    pub fn outcome(&self) -> IntegrityOutcome {
        if self.accepted {
            IntegrityOutcome::Accepted {
                server_digest: self.sha256.as_ref().map(|d| d.to_ascii_lowercase()),
            }
        } else {
            IntegrityOutcome::Rejected {
                detail: self
                    .detail
                    .clone()
                    .unwrap_or_else(|| "rejected by server".into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negotiate_request_field_names() {
        let req = NegotiateUploadRequest {
            filename: "interview.mp4".into(),
            content_type: "video/mp4".into(),
            size: 1024,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["filename"], "interview.mp4");
        assert_eq!(json["content_type"], "video/mp4");
        assert_eq!(json["size"], 1024);
    }

    #[test]
    fn negotiate_response_without_expiry() {
        let json = r#"{"evidence_id":"ev-1","upload_url":"https://blob.local/put/ev-1"}"#;
        let resp: NegotiateUploadResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.evidence_id, "ev-1");
        assert!(resp.expires_at.is_none());

        let out = serde_json::to_string(&resp).unwrap();
        assert!(!out.contains("expires_at"));
    }

    #[test]
    fn accepted_outcome_lowercases_digest() {
        let resp = CompleteUploadResponse {
            accepted: true,
            sha256: Some("ABCDEF".into()),
            detail: None,
        };
        assert_eq!(
            resp.outcome(),
            IntegrityOutcome::Accepted {
                server_digest: Some("abcdef".into())
            }
        );
    }

    #[test]
    fn rejected_outcome_defaults_detail() {
        let resp: CompleteUploadResponse = serde_json::from_str(r#"{"accepted":false}"#).unwrap();
        assert_eq!(
            resp.outcome(),
            IntegrityOutcome::Rejected {
                detail: "rejected by server".into()
            }
        );
    }
}
