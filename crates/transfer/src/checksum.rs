use bytes::Bytes;
use sha2::{Digest, Sha256};

use crate::{LocalFile, TransferError};

/// A file's full content together with its SHA-256 digest.
///
/// The pipeline transfers exactly `data`, so the digest always describes
/// the bytes that were sent.
#[derive(Debug, Clone)]
pub struct HashedContent {
    pub data: Bytes,
    /// Lowercase hex SHA-256 of `data`.
    pub digest: String,
}

/// Computes SHA-256 of `data` and returns the hex-encoded digest.
pub fn checksum_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Reads `file` fully into memory and hashes it on a blocking worker.
///
/// Whole-file reads are fine for evidentiary file sizes; very large files
/// cost memory, not correctness.
pub async fn hash_local_file(file: &LocalFile) -> Result<HashedContent, TransferError> {
    let data = file.read_all().await?;
    let digest = tokio::task::spawn_blocking({
        let data = data.clone();
        move || checksum_bytes(&data)
    })
    .await
    .map_err(|e| TransferError::Worker(e.to_string()))?;

    Ok(HashedContent { data, digest })
}
