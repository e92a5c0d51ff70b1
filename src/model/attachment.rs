//! Attachment models.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Attachment metadata as reported by the source instance.
///
/// The filename is the only identity used when comparing against the
/// target; contents are never hashed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentDescriptor {
    pub filename: String,

    /// URL the attachment bytes are served from.
    pub content: String,

    #[serde(default)]
    pub size: u64,
}

/// A file sitting in the local staging area, ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub name: String,
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_from_jira_json() {
        let json = r#"{
            "id": "10001",
            "filename": "screenshot.png",
            "content": "https://jira.example.com/secure/attachment/10001/screenshot.png",
            "size": 2048,
            "mimeType": "image/png"
        }"#;
        let d: AttachmentDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(d.filename, "screenshot.png");
        assert_eq!(d.size, 2048);
        assert!(d.content.ends_with("/screenshot.png"));
    }

    #[test]
    fn test_descriptor_size_defaults_to_zero() {
        let json = r#"{"filename": "a.txt", "content": "http://x/a.txt"}"#;
        let d: AttachmentDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(d.size, 0);
    }
}
