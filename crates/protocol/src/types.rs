/// Server verdict on a completed upload.
///
/// The backend is the sole authority on acceptance. A locally computed
/// digest never turns a rejection into an acceptance or the reverse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityOutcome {
    Accepted { server_digest: Option<String> },
    Rejected { detail: String },
}

/// How a local digest relates to the server's recomputed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestComparison {
    Match,
    Mismatch,
    /// The server did not report a digest, or no local digest exists.
    Unavailable,
}

impl DigestComparison {
    /// Compares two hex digests case-insensitively.
    pub fn compare(local: Option<&str>, server: Option<&str>) -> Self {
        match (local, server) {
            (Some(l), Some(s)) if l.eq_ignore_ascii_case(s) => Self::Match,
            (Some(_), Some(_)) => Self::Mismatch,
            _ => Self::Unavailable,
        }
    }
}
