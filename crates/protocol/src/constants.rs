use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Public API root.
pub const DEFAULT_BASE_URL: &str = "https://dev.wetransfer.com/v2";

/// Header carrying the developer API key on every call.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Media type of every JSON body sent or accepted.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Characters kept verbatim inside an id path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// A remote API endpoint, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Authorize,
    CreateTransfer,
    TransferPartUploadUrl {
        transfer_id: String,
        file_id: String,
        part_number: u32,
    },
    TransferFileComplete {
        transfer_id: String,
        file_id: String,
    },
    FinalizeTransfer {
        transfer_id: String,
    },
    CreateBoard,
    GetBoard {
        board_id: String,
    },
    AddBoardLinks {
        board_id: String,
    },
    AddBoardFiles {
        board_id: String,
    },
    BoardPartUploadUrl {
        board_id: String,
        file_id: String,
        part_number: u32,
        multipart_upload_id: String,
    },
    BoardFileComplete {
        board_id: String,
        file_id: String,
    },
}

impl Endpoint {
    /// Returns the path (with a leading `/`) for this endpoint.
    pub fn path(&self) -> String {
        match self {
            Endpoint::Authorize => "/authorize".into(),
            Endpoint::CreateTransfer => "/transfers".into(),
            Endpoint::TransferPartUploadUrl {
                transfer_id,
                file_id,
                part_number,
            } => format!(
                "/transfers/{}/files/{}/upload-url/{part_number}",
                segment(transfer_id),
                segment(file_id)
            ),
            Endpoint::TransferFileComplete {
                transfer_id,
                file_id,
            } => format!(
                "/transfers/{}/files/{}/upload-complete",
                segment(transfer_id),
                segment(file_id)
            ),
            Endpoint::FinalizeTransfer { transfer_id } => {
                format!("/transfers/{}/finalize", segment(transfer_id))
            }
            Endpoint::CreateBoard => "/boards".into(),
            Endpoint::GetBoard { board_id } => format!("/boards/{}", segment(board_id)),
            Endpoint::AddBoardLinks { board_id } => {
                format!("/boards/{}/links", segment(board_id))
            }
            Endpoint::AddBoardFiles { board_id } => {
                format!("/boards/{}/files", segment(board_id))
            }
            Endpoint::BoardPartUploadUrl {
                board_id,
                file_id,
                part_number,
                multipart_upload_id,
            } => format!(
                "/boards/{}/files/{}/upload-url/{part_number}/{}",
                segment(board_id),
                segment(file_id),
                segment(multipart_upload_id)
            ),
            Endpoint::BoardFileComplete { board_id, file_id } => format!(
                "/boards/{}/files/{}/upload-complete",
                segment(board_id),
                segment(file_id)
            ),
        }
    }

    /// Joins this endpoint onto `base_url`, tolerating a trailing slash.
    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path())
    }
}

fn segment(raw: &str) -> String {
    utf8_percent_encode(raw, SEGMENT).to_string()
}
