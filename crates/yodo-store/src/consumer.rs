use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};
use yodo_types::BlobId;

use crate::error::{StoreError, StoreResult};
use crate::fs::FsOnceStore;
use crate::object::{Metadata, StoredBlob};
use crate::primitives::{exclusive_create, try_remove};

/// Exclusive right to serve and destroy one blob.
///
/// Acquired by exclusively creating the claim marker. Dropping the guard
/// removes the payload, the metadata and finally the marker, on every exit
/// path including unwinding. The marker goes last: while it exists no other
/// claim can start, so nobody can observe the blob half-deleted.
struct ClaimGuard<'a> {
    store: &'a FsOnceStore,
    id: BlobId,
}

impl<'a> ClaimGuard<'a> {
    fn acquire(store: &'a FsOnceStore, id: BlobId) -> io::Result<Self> {
        exclusive_create(&store.claim_path(&id))?;
        Ok(Self { store, id })
    }
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        try_remove(&self.store.payload_path(&self.id));
        try_remove(&self.store.metadata_path(&self.id));
        try_remove(&self.store.claim_path(&self.id));
        debug!(id = %self.id, "claim released; artifacts removed");
    }
}

impl FsOnceStore {
    /// Read metadata, then payload. Any failure is reported as `NotFound`.
    ///
    /// Metadata is written last on commit, so reading it first means a
    /// half-committed blob is never returned.
    pub(crate) fn read_blob(&self, id: &BlobId) -> StoreResult<StoredBlob> {
        let raw = read_artifact(id, &self.metadata_path(id))?;
        let metadata = Metadata::from_json(&raw).map_err(|e| {
            warn!(id = %id, error = %e, "unreadable metadata artifact");
            StoreError::NotFound(*id)
        })?;
        let payload = read_artifact(id, &self.payload_path(id))?;
        Ok(StoredBlob {
            id: *id,
            payload,
            metadata,
        })
    }

    /// Win the claim marker, read the blob, destroy it.
    pub(crate) fn claim_blob(&self, id: &BlobId) -> StoreResult<StoredBlob> {
        let guard = match ClaimGuard::acquire(self, *id) {
            Ok(guard) => guard,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!(id = %id, "lost claim race");
                return Err(StoreError::NotFound(*id));
            }
            Err(e) => {
                warn!(id = %id, error = %e, "failed to create claim marker");
                return Err(StoreError::NotFound(*id));
            }
        };

        let blob = self.read_blob(id);
        drop(guard);

        if let Ok(blob) = &blob {
            debug!(id = %id, size = blob.size(), "blob claimed");
        }
        blob
    }
}

fn read_artifact(id: &BlobId, path: &Path) -> StoreResult<Vec<u8>> {
    fs::read(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            debug!(id = %id, path = %path.display(), "artifact missing");
        } else {
            warn!(id = %id, path = %path.display(), error = %e, "failed to read artifact");
        }
        StoreError::NotFound(*id)
    })
}
