use serde::{Deserialize, Serialize};

/// A file announced to the server before its chunks are uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    pub size: u64,
}

/// A web link attached to a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
}

/// Chunking instructions the server returns for each registered file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipartInfo {
    /// Multipart upload id. Only boards hand one out.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "part_numbers", default)]
    pub number_of_parts: u32,
    #[serde(default)]
    pub chunk_size: u64,
}

/// A file as registered on the server side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub multipart: MultipartInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_file_from_json() {
        let json = r#"{"id":"f1","name":"a.bin","size":10,
            "multipart":{"part_numbers":2,"chunk_size":6}}"#;
        let file: RemoteFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.multipart.number_of_parts, 2);
        assert_eq!(file.multipart.chunk_size, 6);
        assert!(file.multipart.id.is_empty());
    }

    #[test]
    fn link_without_title_omits_field() {
        let link = LinkEntry {
            url: "https://example.com".into(),
            title: String::new(),
        };
        let json = serde_json::to_string(&link).unwrap();
        assert_eq!(json, r#"{"url":"https://example.com"}"#);
    }
}
