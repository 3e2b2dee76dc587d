//! Data types for the upload pipeline.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use filedrop_protocol::types::RemoteFile;
use serde::Serialize;

/// A named step of the per-file upload sequence.
///
/// Variants are ordered; a file only ever moves to a later stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Stage {
    #[default]
    NotSet,
    Token,
    TransferRequest,
    AddFiles,
    SplitFiles,
    UploadUrl,
    Upload,
    Complete,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::NotSet => "not set",
            Stage::Token => "token",
            Stage::TransferRequest => "transfer request",
            Stage::AddFiles => "add files",
            Stage::SplitFiles => "split files",
            Stage::UploadUrl => "upload url",
            Stage::Upload => "upload",
            Stage::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// How an upload operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResultCode {
    Success,
    /// The server reported a failure.
    ApiError,
    /// A call never completed: timeout, refused connection or cancellation.
    NoConnection,
    /// Anything else, such as a local I/O failure.
    UnknownError,
}

/// Final result of [`crate::UploadOrchestrator::upload_files`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    pub result: ResultCode,
    /// Stage reached when the operation ended.
    pub stage: Stage,
    pub message: String,
    /// Shareable URL of a finished transfer. Empty otherwise.
    pub download_url: String,
}

impl UploadOutcome {
    pub fn success(message: impl Into<String>, download_url: impl Into<String>) -> Self {
        Self {
            result: ResultCode::Success,
            stage: Stage::Complete,
            message: message.into(),
            download_url: download_url.into(),
        }
    }

    pub fn failure(result: ResultCode, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            result,
            stage,
            message: message.into(),
            download_url: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result == ResultCode::Success
    }
}

/// A server-registered file joined with its local source.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub chunk_size: u64,
    pub number_of_parts: u32,
    pub local_path: PathBuf,
    /// Only boards hand out a multipart upload id.
    pub multipart_upload_id: Option<String>,
    /// Pre-signed URL per part number.
    pub upload_urls: BTreeMap<u32, String>,
    stage: Stage,
}

impl FileUpload {
    pub fn new(remote: RemoteFile, local_path: PathBuf, local_size: u64) -> Self {
        let multipart = remote.multipart;
        Self {
            id: remote.id,
            name: remote.name,
            size: if remote.size > 0 { remote.size } else { local_size },
            chunk_size: multipart.chunk_size,
            number_of_parts: multipart.number_of_parts,
            local_path,
            multipart_upload_id: (!multipart.id.is_empty()).then_some(multipart.id),
            upload_urls: BTreeMap::new(),
            stage: Stage::AddFiles,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Moves the file to `stage`. Moving backwards is ignored.
    pub fn advance(&mut self, stage: Stage) {
        if stage > self.stage {
            self.stage = stage;
        }
    }

    /// Returns `true` once every part has a pre-signed URL.
    pub fn all_urls_resolved(&self) -> bool {
        (1..=self.number_of_parts).all(|n| self.upload_urls.contains_key(&n))
    }
}
