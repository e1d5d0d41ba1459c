//! Admission filtering for dropped or selected files.
//!
//! Files rejected here never become tasks.

use casevault_transfer::LocalFile;
use tracing::debug;

/// One token of an accept filter.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AcceptToken {
    /// `.mp4`: matches the file extension.
    Extension(String),
    /// `video/*`: matches the top-level content type.
    TypeFamily(String),
    /// `application/pdf`: matches the content type exactly.
    Mime(String),
}

/// Comma-separated accept list such as `.mp4,.mov,image/*`.
///
/// Matching is case-insensitive. An empty filter accepts everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptFilter {
    tokens: Vec<AcceptToken>,
}

impl AcceptFilter {
    /// Parses an accept list. Blank tokens are ignored.
    pub fn parse(spec: &str) -> Self {
        let tokens = spec
            .split(',')
            .map(|t| t.trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty())
            .map(|t| {
                if let Some(ext) = t.strip_prefix('.') {
                    AcceptToken::Extension(ext.to_string())
                } else if let Some(family) = t.strip_suffix("/*") {
                    AcceptToken::TypeFamily(family.to_string())
                } else {
                    AcceptToken::Mime(t)
                }
            })
            .collect();
        Self { tokens }
    }

    /// Accepts everything.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Whether `file` passes by extension or by content type.
    pub fn matches(&self, file: &LocalFile) -> bool {
        if self.tokens.is_empty() {
            return true;
        }
        let ext = file.extension();
        let mime = file.content_type().to_ascii_lowercase();
        let family = mime.split('/').next().unwrap_or_default();

        self.tokens.iter().any(|token| match token {
            AcceptToken::Extension(e) => ext.as_deref() == Some(e.as_str()),
            AcceptToken::TypeFamily(f) => family == f,
            AcceptToken::Mime(m) => mime == *m,
        })
    }
}

/// Why a file was left out of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    TypeNotAccepted,
    TooManyFiles,
}

/// Outcome of filtering one selection.
#[derive(Debug, Clone, Default)]
pub struct Admission {
    /// Admitted files in their original order.
    pub accepted: Vec<LocalFile>,
    pub rejected: Vec<(LocalFile, RejectReason)>,
}

/// Filters one selection: type first, then the count limit.
///
/// `max_files == 0` means unlimited. Files beyond the limit are dropped
/// from the end so the earliest selected files win.
pub fn admit_files(files: Vec<LocalFile>, filter: &AcceptFilter, max_files: usize) -> Admission {
    let mut admission = Admission::default();

    for file in files {
        if !filter.matches(&file) {
            debug!(file = %file.name(), content_type = %file.content_type(), "file type not accepted");
            admission.rejected.push((file, RejectReason::TypeNotAccepted));
        } else if max_files > 0 && admission.accepted.len() >= max_files {
            debug!(file = %file.name(), max_files, "file count limit reached");
            admission.rejected.push((file, RejectReason::TooManyFiles));
        } else {
            admission.accepted.push(file);
        }
    }

    admission
}
