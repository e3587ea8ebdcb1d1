use std::io::Read;

use yodo_types::BlobId;

use crate::error::StoreResult;
use crate::object::{Metadata, StoredBlob};

/// Single-delivery blob store.
///
/// All implementations must satisfy these invariants:
/// - `allocate` returns only after the blob is fully committed, under an
///   identifier that has never been handed out before. On failure nothing is
///   left behind.
/// - For a committed identifier, exactly one `claim` ever succeeds. Every
///   other `claim` (concurrent or later) and every `peek` after it report
///   [`StoreError::NotFound`](crate::StoreError::NotFound).
/// - "Never existed", "already claimed" and "unreadable" are reported
///   identically.
/// - Blobs are immutable; there is no update operation.
pub trait OnceStore: Send + Sync {
    /// Copy `payload` into a new blob and return its identifier.
    ///
    /// Fails with `PayloadTooLarge` as soon as more than `max_size` bytes have
    /// been read, `UpstreamRead` if `payload` fails, and `StorageExhausted`
    /// if the blob cannot be committed.
    fn allocate(
        &self,
        payload: &mut dyn Read,
        metadata: Metadata,
        max_size: u64,
    ) -> StoreResult<BlobId>;

    /// Read a blob without consuming it.
    fn peek(&self, id: &BlobId) -> StoreResult<StoredBlob>;

    /// Read a blob and destroy it. Succeeds at most once per identifier.
    fn claim(&self, id: &BlobId) -> StoreResult<StoredBlob>;

    /// Resolve a blob, destroying it when `destructive` is set.
    fn resolve(&self, id: &BlobId, destructive: bool) -> StoreResult<StoredBlob> {
        if destructive {
            self.claim(id)
        } else {
            self.peek(id)
        }
    }
}
