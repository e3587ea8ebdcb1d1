use serde::{Deserialize, Serialize};
use yodo_types::BlobId;

use crate::error::{StoreError, StoreResult};

/// Content type reported for blobs uploaded without one.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Descriptive metadata stored next to a payload.
///
/// Persisted as `{"content_type": ..., "filename": ...}` with `null` for
/// absent values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Media type supplied (or guessed) at upload time.
    #[serde(default)]
    pub content_type: Option<String>,
    /// Display name, used only to annotate downloads.
    #[serde(default)]
    pub filename: Option<String>,
}

impl Metadata {
    /// Create metadata, treating empty strings as absent.
    pub fn new(content_type: Option<String>, filename: Option<String>) -> Self {
        Self {
            content_type: content_type.filter(|s| !s.is_empty()),
            filename: filename.filter(|s| !s.is_empty()),
        }
    }

    /// The content type to serve: the stored one, or
    /// [`FALLBACK_CONTENT_TYPE`].
    pub fn effective_content_type(&self) -> &str {
        self.content_type
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(FALLBACK_CONTENT_TYPE)
    }

    /// The filename to annotate downloads with, if any.
    pub fn display_filename(&self) -> Option<&str> {
        self.filename.as_deref().filter(|s| !s.is_empty())
    }

    pub(crate) fn to_json(&self) -> StoreResult<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| StoreError::exhausted(format!("failed to encode metadata: {e}")))
    }

    pub(crate) fn from_json(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}

/// A resolved blob: payload plus metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredBlob {
    /// The handle this blob was stored under.
    pub id: BlobId,
    /// The payload bytes, exactly as uploaded.
    pub payload: Vec<u8>,
    /// Content type and filename.
    pub metadata: Metadata,
}

impl StoredBlob {
    /// Size of the payload in bytes.
    pub fn size(&self) -> u64 {
        self.payload.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_strings_are_absent() {
        let meta = Metadata::new(Some(String::new()), Some(String::new()));
        assert_eq!(meta, Metadata::default());
    }

    #[test]
    fn fallback_content_type() {
        assert_eq!(
            Metadata::default().effective_content_type(),
            "application/octet-stream"
        );
        let meta = Metadata::new(Some("image/png".into()), None);
        assert_eq!(meta.effective_content_type(), "image/png");
    }

    #[test]
    fn display_filename_skips_empty() {
        let meta = Metadata {
            content_type: None,
            filename: Some(String::new()),
        };
        assert!(meta.display_filename().is_none());
    }

    #[test]
    fn json_record_shape() {
        let meta = Metadata::new(Some("image/png".into()), None);
        let json: serde_json::Value = serde_json::from_slice(&meta.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "content_type": "image/png", "filename": null })
        );
    }

    #[test]
    fn json_decode_tolerates_missing_fields() {
        let meta = Metadata::from_json(br#"{"filename": "a.txt"}"#).unwrap();
        assert_eq!(meta.filename.as_deref(), Some("a.txt"));
        assert!(meta.content_type.is_none());
    }

    #[test]
    fn json_decode_rejects_truncated_record() {
        assert!(Metadata::from_json(br#"{"content_type": "ima"#).is_err());
        assert!(Metadata::from_json(b"").is_err());
    }
}
