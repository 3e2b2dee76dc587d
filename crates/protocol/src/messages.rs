use serde::{Deserialize, Serialize};

use crate::types::{FileDescriptor, RemoteFile};

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Exchanges the API key plus a user identifier for a bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizeRequest {
    pub user_identifier: String,
}

/// Creates a transfer and registers all of its files in one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTransferRequest {
    /// Display name of the transfer.
    pub message: String,
    pub files: Vec<FileDescriptor>,
}

/// Marks one transfer file as fully uploaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteFileRequest {
    pub part_numbers: u32,
}

/// Creates an empty board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBoardRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Response payloads
//
// Every field defaults so that error bodies (which usually only carry
// `success` and `message`) still decode.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorizeResponse {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateTransferResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub files: Vec<RemoteFile>,
}

/// Returned by create-board and get-board.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub state: String,
    /// Public board URL.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

/// Body of the add-board-files response.
pub type AddBoardFilesResponse = Vec<RemoteFile>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadUrlResponse {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompleteFileResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub retries: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub chunk_size: u64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalizeTransferResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub message: String,
    /// Shareable download URL.
    #[serde(default)]
    pub url: String,
}

/// One element of the add-links response array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddLinkResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub meta: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_request_field_name() {
        let req = AuthorizeRequest {
            user_identifier: "alice".into(),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"user_identifier":"alice"}"#);
    }

    #[test]
    fn create_transfer_request_shape() {
        let req = CreateTransferRequest {
            message: "holiday".into(),
            files: vec![FileDescriptor {
                name: "a.jpg".into(),
                size: 42,
            }],
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["message"], "holiday");
        assert_eq!(v["files"][0]["name"], "a.jpg");
        assert_eq!(v["files"][0]["size"], 42);
    }

    #[test]
    fn board_request_without_description() {
        let req = CreateBoardRequest {
            name: "b".into(),
            description: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("description"));
    }

    #[test]
    fn error_body_decodes_into_any_response() {
        let json = r#"{"success":false,"message":"Forbidden"}"#;
        let resp: CreateTransferResponse = serde_json::from_str(json).unwrap();
        assert!(resp.files.is_empty());
        assert_eq!(resp.message, "Forbidden");

        let resp: FinalizeTransferResponse = serde_json::from_str(json).unwrap();
        assert!(resp.url.is_empty());
    }

    #[test]
    fn create_transfer_response_files() {
        let json = r#"{"success":true,"id":"t-1","state":"uploading","files":[
            {"id":"f-1","name":"a.bin","size":1000000,"multipart":{"part_numbers":1,"chunk_size":6291456}},
            {"id":"f-2","name":"b.bin","size":9000000,"multipart":{"part_numbers":2,"chunk_size":6291456}}
        ]}"#;
        let resp: CreateTransferResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.id, "t-1");
        assert_eq!(resp.files.len(), 2);
        assert_eq!(resp.files[1].multipart.number_of_parts, 2);
    }
}
