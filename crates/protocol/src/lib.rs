//! Wire types shared between the casevault client crates and the evidence API.
//!
//! All payloads serialize with snake_case field names, matching the
//! backend's JSON.

pub mod manifest;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use manifest::{
    AuditMismatch, AuditReplayResult, EvidenceDescriptor, Manifest, ManifestError,
    ManifestVerification,
};
pub use messages::{CompleteUploadResponse, NegotiateUploadRequest, NegotiateUploadResponse};
pub use types::{DigestComparison, IntegrityOutcome};
