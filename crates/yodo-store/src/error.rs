use std::path::PathBuf;

use yodo_types::BlobId;

/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The payload exceeded the configured size limit.
    #[error("payload exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: u64 },

    /// The payload source failed before the upload completed.
    #[error("failed to read upload stream: {0}")]
    UpstreamRead(#[source] std::io::Error),

    /// No identifier could be reserved, or a commit write failed.
    ///
    /// Ordinary contention never produces this; it points at filesystem
    /// trouble.
    #[error("storage exhausted: {reason}")]
    StorageExhausted { reason: String },

    /// The blob does not exist, was already claimed, or could not be read.
    #[error("blob not found: {0}")]
    NotFound(BlobId),

    /// The base directory is unusable.
    #[error("invalid state directory {path:?}: {reason}")]
    InvalidRoot { path: PathBuf, reason: String },
}

impl StoreError {
    pub(crate) fn exhausted(reason: impl Into<String>) -> Self {
        Self::StorageExhausted {
            reason: reason.into(),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
