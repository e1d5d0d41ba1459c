use bytes::Bytes;

use crate::DEFAULT_CHUNK_SIZE;

/// A slice of file content ready to hand to the transport.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Byte offset within the file.
    pub offset: u64,
    pub data: Bytes,
}

impl Chunk {
    /// Offset just past this chunk, i.e. bytes sent once it is accepted.
    pub fn end(&self) -> u64 {
        self.offset + self.data.len() as u64
    }
}

/// Splits in-memory content into fixed-size chunks without copying.
#[derive(Debug, Clone)]
pub struct ChunkSplitter {
    data: Bytes,
    chunk_size: usize,
    offset: usize,
}

impl ChunkSplitter {
    /// If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`] is used.
    pub fn new(data: Bytes, chunk_size: usize) -> Self {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Self {
            data,
            chunk_size,
            offset: 0,
        }
    }

    /// Total content length in bytes.
    pub fn total(&self) -> u64 {
        self.data.len() as u64
    }

    /// Bytes not yet yielded.
    pub fn remaining(&self) -> u64 {
        (self.data.len() - self.offset) as u64
    }
}

impl Iterator for ChunkSplitter {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.offset >= self.data.len() {
            return None;
        }
        let end = (self.offset + self.chunk_size).min(self.data.len());
        let chunk = Chunk {
            offset: self.offset as u64,
            data: self.data.slice(self.offset..end),
        };
        self.offset = end;
        Some(chunk)
    }
}
