//! Multi-file chunked upload pipeline.
//!
//! This crate sequences the remote calls of [`filedrop_client`] into one
//! upload operation and reports weighted progress along the way. It has no
//! UI dependencies; callers observe progress through a [`ProgressSink`].
//!
//! # Pipeline
//!
//! 1. **Token**: reuse the cached bearer token or authorize
//! 2. **TransferRequest**: create the transfer (or board)
//! 3. **AddFiles**: register files on a board
//! 4. Per file, in server order:
//!    **SplitFiles** → **UploadUrl** → **Upload** → **Complete**
//! 5. Finalize the transfer and return its download URL
//!
//! The first failure aborts the whole operation. Nothing is retried.

pub mod destination;
pub mod error;
pub mod orchestrator;
pub mod progress;
pub mod types;

pub use destination::{BoardDestination, Destination, Target, TransferDestination};
pub use error::ValidationError;
pub use orchestrator::UploadOrchestrator;
pub use progress::{NoProgress, ProgressReport, ProgressSink, allocate_shares};
pub use types::{FileUpload, ResultCode, Stage, UploadOutcome};
