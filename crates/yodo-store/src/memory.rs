use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::Read;
use std::sync::Mutex;

use yodo_types::BlobId;

use crate::error::{StoreError, StoreResult};
use crate::fs::DEFAULT_MAX_ATTEMPTS;
use crate::object::{Metadata, StoredBlob};
use crate::primitives::copy_bounded;
use crate::traits::OnceStore;

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. Single delivery falls out of removing
/// the entry under the lock. Nothing survives the process.
pub struct InMemoryOnceStore {
    blobs: Mutex<HashMap<BlobId, (Metadata, Vec<u8>)>>,
}

impl InMemoryOnceStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blobs: Mutex::new(HashMap::new()),
        }
    }

    /// Number of blobs waiting to be claimed.
    pub fn len(&self) -> usize {
        self.blobs.lock().expect("lock poisoned").len()
    }

    /// Returns `true` if no blobs are stored.
    pub fn is_empty(&self) -> bool {
        self.blobs.lock().expect("lock poisoned").is_empty()
    }

    /// Total payload bytes held.
    pub fn total_bytes(&self) -> u64 {
        self.blobs
            .lock()
            .expect("lock poisoned")
            .values()
            .map(|(_, payload)| payload.len() as u64)
            .sum()
    }
}

impl Default for InMemoryOnceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OnceStore for InMemoryOnceStore {
    fn allocate(
        &self,
        payload: &mut dyn Read,
        metadata: Metadata,
        max_size: u64,
    ) -> StoreResult<BlobId> {
        let mut data = Vec::new();
        copy_bounded(payload, &mut data, max_size)?;

        let mut map = self.blobs.lock().expect("lock poisoned");
        for _ in 0..DEFAULT_MAX_ATTEMPTS {
            if let Entry::Vacant(slot) = map.entry(BlobId::generate()) {
                let id = *slot.key();
                slot.insert((metadata, data));
                return Ok(id);
            }
        }
        Err(StoreError::exhausted("no identifier could be allocated"))
    }

    fn peek(&self, id: &BlobId) -> StoreResult<StoredBlob> {
        let map = self.blobs.lock().expect("lock poisoned");
        let (metadata, payload) = map.get(id).ok_or(StoreError::NotFound(*id))?;
        Ok(StoredBlob {
            id: *id,
            payload: payload.clone(),
            metadata: metadata.clone(),
        })
    }

    fn claim(&self, id: &BlobId) -> StoreResult<StoredBlob> {
        let (metadata, payload) = self
            .blobs
            .lock()
            .expect("lock poisoned")
            .remove(id)
            .ok_or(StoreError::NotFound(*id))?;
        Ok(StoredBlob {
            id: *id,
            payload,
            metadata,
        })
    }
}

impl std::fmt::Debug for InMemoryOnceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryOnceStore")
            .field("blob_count", &self.len())
            .finish()
    }
}
