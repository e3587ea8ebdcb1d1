use std::io::{self, Read, Write};

use tempfile::NamedTempFile;
use tracing::{debug, error, warn};
use yodo_types::BlobId;

use crate::error::{StoreError, StoreResult};
use crate::fs::FsOnceStore;
use crate::object::Metadata;
use crate::primitives::{copy_bounded, exclusive_create, sync_dir, try_remove};

impl FsOnceStore {
    /// Stage the payload, reserve a fresh identifier, then commit payload and
    /// metadata under it.
    ///
    /// The staged temporary lives in the store directory so the final rename
    /// stays on one filesystem. It is removed on every failure path by
    /// `NamedTempFile`'s destructor.
    pub(crate) fn allocate_blob(
        &self,
        payload: &mut dyn Read,
        metadata: &Metadata,
        max_size: u64,
    ) -> StoreResult<BlobId> {
        let encoded = metadata.to_json()?;

        let mut staged = NamedTempFile::new_in(&self.root)
            .map_err(|e| self.health_failure(format!("failed to create staging file: {e}")))?;
        let size = copy_bounded(payload, staged.as_file_mut(), max_size)?;
        if self.syncs() {
            staged
                .as_file()
                .sync_all()
                .map_err(|e| self.health_failure(format!("failed to sync payload: {e}")))?;
        }

        let mut last_error = None;
        for attempt in 1..=self.config.max_attempts {
            let id = (self.id_source)();
            let dest = self.payload_path(&id);

            if let Err(e) = exclusive_create(&dest) {
                warn!(id = %id, attempt, error = %e, "identifier reservation failed");
                last_error = Some(format!("reserving {id}: {e}"));
                continue;
            }

            match staged.persist(&dest) {
                Ok(_) => return self.commit_metadata(id, &encoded, size),
                Err(e) => {
                    warn!(id = %id, attempt, error = %e.error, "payload rename failed");
                    last_error = Some(format!("renaming payload onto {id}: {}", e.error));
                    try_remove(&dest);
                    staged = e.file;
                }
            }
        }

        let mut reason = format!(
            "no identifier could be allocated after {} attempts",
            self.config.max_attempts
        );
        if let Some(last) = last_error {
            reason.push_str(&format!("; last error {last}"));
        }
        Err(self.health_failure(reason))
    }

    /// Write the metadata artifact, which makes the blob resolvable. On
    /// failure the already-renamed payload is removed again.
    fn commit_metadata(&self, id: BlobId, encoded: &[u8], size: u64) -> StoreResult<BlobId> {
        if let Err(e) = self.write_metadata(&id, encoded) {
            try_remove(&self.metadata_path(&id));
            try_remove(&self.payload_path(&id));
            return Err(self.health_failure(format!("failed to commit metadata for {id}: {e}")));
        }
        debug!(id = %id, size, "blob committed");
        Ok(id)
    }

    fn write_metadata(&self, id: &BlobId, encoded: &[u8]) -> io::Result<()> {
        let mut staged = NamedTempFile::new_in(&self.root)?;
        staged.write_all(encoded)?;
        if self.syncs() {
            staged.as_file().sync_all()?;
        }
        staged.persist(self.metadata_path(id)).map_err(|e| e.error)?;
        if self.syncs() {
            sync_dir(&self.root)?;
        }
        Ok(())
    }

    fn health_failure(&self, reason: String) -> StoreError {
        error!(root = %self.root.display(), %reason, "storage failure during allocation");
        StoreError::exhausted(reason)
    }
}
