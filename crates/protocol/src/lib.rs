//! Wire types for the file-transfer REST API (v2).
//!
//! Request bodies, response bodies and endpoint path templates. No I/O
//! lives here; `filedrop-client` owns the transport.

pub mod constants;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use constants::Endpoint;
pub use types::{FileDescriptor, LinkEntry, MultipartInfo, RemoteFile};
