//! Upload precondition errors.

use std::path::PathBuf;

/// Invalid arguments to an upload, detected before any network call.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("no files to upload")]
    EmptyPathList,

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("file is empty: {}", .0.display())]
    EmptyFile(PathBuf),

    #[error("file has no usable name: {}", .0.display())]
    NoFileName(PathBuf),

    #[error("upload name must not be empty")]
    EmptyName,

    #[error("user identifier must not be empty")]
    EmptyUser,
}
