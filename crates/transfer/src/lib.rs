//! Chunk planning and file splitting for multipart uploads.
//!
//! A file is cut into numbered parts of a server-chosen size; every part
//! except the last is exactly `chunk_size` bytes long.

mod plan;
mod split;

pub use plan::{ChunkPart, ChunkPlan, number_of_parts};
pub use split::{DiskSplitter, FileSplitter, part_path};

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid file: {0}")]
    InvalidFile(String),

    #[error("invalid chunk size: {0}")]
    InvalidChunkSize(u64),
}
