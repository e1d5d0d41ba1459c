use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::TransferError;

/// Content type declared for files whose extension is not recognized.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Where a file's bytes come from.
#[derive(Debug, Clone)]
enum FileSource {
    /// Read lazily from disk when the pipeline hashes it.
    Path(PathBuf),
    /// Already in memory (drag-and-drop payloads, tests).
    Memory(Bytes),
}

/// A file selected by the user: name, declared size and content type, plus
/// a handle on its bytes.
///
/// Immutable once built; clones share the same source.
#[derive(Debug, Clone)]
pub struct LocalFile {
    name: String,
    size: u64,
    content_type: String,
    source: FileSource,
}

impl LocalFile {
    /// Builds a reference to a file on disk, reading its size from metadata
    /// and its content type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, TransferError> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_type = detect_content_type(&name)
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .to_string();

        Ok(Self {
            name,
            size: metadata.len(),
            content_type,
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    /// Builds a reference to bytes already held in memory.
    ///
    /// An empty `content_type` is replaced by one guessed from `name`.
    pub fn from_bytes(
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let name = name.into();
        let data = data.into();
        let mut content_type = content_type.into();
        if content_type.is_empty() {
            content_type = detect_content_type(&name)
                .unwrap_or(FALLBACK_CONTENT_TYPE)
                .to_string();
        }
        Self {
            name,
            size: data.len() as u64,
            content_type,
            source: FileSource::Memory(data),
        }
    }

    /// Name exactly as the user supplied it (unsanitized).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Lower-cased extension without the dot, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    /// Reads the full content into memory.
    pub async fn read_all(&self) -> Result<Bytes, TransferError> {
        match &self.source {
            FileSource::Memory(data) => Ok(data.clone()),
            FileSource::Path(path) => tokio::fs::read(path)
                .await
                .map(Bytes::from)
                .map_err(|source| TransferError::Unreadable {
                    name: self.name.clone(),
                    source,
                }),
        }
    }
}

/// Detects a MIME content type from a file name's extension.
pub fn detect_content_type(name: &str) -> Option<&'static str> {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("mp4" | "m4v") => Some("video/mp4"),
        Some("mov") => Some("video/quicktime"),
        Some("avi") => Some("video/x-msvideo"),
        Some("mkv") => Some("video/x-matroska"),
        Some("webm") => Some("video/webm"),
        Some("mp3") => Some("audio/mpeg"),
        Some("wav") => Some("audio/wav"),
        Some("m4a") => Some("audio/mp4"),
        Some("png") => Some("image/png"),
        Some("jpg" | "jpeg") => Some("image/jpeg"),
        Some("gif") => Some("image/gif"),
        Some("webp") => Some("image/webp"),
        Some("tif" | "tiff") => Some("image/tiff"),
        Some("heic") => Some("image/heic"),
        Some("pdf") => Some("application/pdf"),
        Some("doc") => Some("application/msword"),
        Some("docx") => {
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        }
        Some("txt" | "log") => Some("text/plain"),
        Some("csv") => Some("text/csv"),
        Some("json") => Some("application/json"),
        Some("eml") => Some("message/rfc822"),
        Some("zip") => Some("application/zip"),
        _ => None,
    }
}
