//! Client-side building blocks of the evidence upload pipeline.
//!
//! Nothing in this crate talks to the network: it names files safely,
//! hashes their bytes, splits them for streaming and maps stage progress
//! onto a single percentage.

mod checksum;
mod chunks;
mod file;
mod progress;
mod sanitize;

pub use checksum::{HashedContent, checksum_bytes, hash_local_file};
pub use chunks::{Chunk, ChunkSplitter};
pub use file::{LocalFile, detect_content_type};
pub use progress::{ProgressFn, SpeedCalculator, StageCheckpoints};
pub use sanitize::{UNNAMED, sanitize_filename};

/// Default chunk size used when streaming bytes to a destination: 256 KiB.
///
/// Only affects progress granularity; the destination sees one body.
pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot read {name}: {source}")]
    Unreadable {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("hash worker failed: {0}")]
    Worker(String),
}
