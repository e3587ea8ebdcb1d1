use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::info;
use yodo_types::BlobId;

use crate::error::{StoreError, StoreResult};
use crate::object::{Metadata, StoredBlob};
use crate::traits::OnceStore;

/// Suffix of the metadata artifact (`<id>.json`).
pub const METADATA_SUFFIX: &str = ".json";

/// Suffix of the transient claim marker (`<id>.lock`).
pub const CLAIM_SUFFIX: &str = ".lock";

/// Identifier reservations attempted before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Flush strategy for commits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncMode {
    /// `fsync` the payload, the metadata and the directory before returning
    /// an identifier.
    #[default]
    Always,
    /// Rely on OS page-cache buffering (faster, not crash-durable).
    OsDefault,
}

/// Configuration for [`FsOnceStore`].
#[derive(Clone, Debug)]
pub struct FsStoreConfig {
    /// Flush strategy for commits.
    pub sync: SyncMode,
    /// Reservation attempts per upload before reporting
    /// [`StoreError::StorageExhausted`].
    pub max_attempts: u32,
}

impl Default for FsStoreConfig {
    fn default() -> Self {
        Self {
            sync: SyncMode::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

type IdSource = Box<dyn Fn() -> BlobId + Send + Sync>;

/// Blob store backed by a single flat directory.
///
/// Each blob `id` is made of sibling artifacts:
///
/// ```text
/// <id>        payload bytes
/// <id>.json   {"content_type": ..., "filename": ...}
/// <id>.lock   empty claim marker, present only while a claim is in flight
/// .tmp*       uploads and metadata being staged
/// ```
///
/// A blob exists once its metadata artifact is in place; the payload is
/// always renamed into position first. All coordination between requests,
/// threads and processes goes through exclusive creation and rename in this
/// directory, so several processes may share one.
pub struct FsOnceStore {
    pub(crate) root: PathBuf,
    pub(crate) config: FsStoreConfig,
    pub(crate) id_source: IdSource,
}

impl FsOnceStore {
    /// Open a store rooted at an existing, absolute, writable directory.
    pub fn open(root: impl AsRef<Path>, config: FsStoreConfig) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        let invalid = |reason: String| StoreError::InvalidRoot {
            path: root.clone(),
            reason,
        };

        if !root.is_absolute() {
            return Err(invalid("not an absolute path".into()));
        }
        let meta = fs::metadata(&root).map_err(|e| invalid(e.to_string()))?;
        if !meta.is_dir() {
            return Err(invalid("not a directory".into()));
        }
        tempfile::NamedTempFile::new_in(&root)
            .map_err(|e| invalid(format!("not writable: {e}")))?;

        info!(root = %root.display(), sync = ?config.sync, "opened blob store");

        Ok(Self {
            root,
            config,
            id_source: Box::new(BlobId::generate),
        })
    }

    /// Replace the identifier generator.
    ///
    /// Meant for tests that need to force collisions; production code keeps
    /// the default random source.
    pub fn with_id_source(mut self, source: impl Fn() -> BlobId + Send + Sync + 'static) -> Self {
        self.id_source = Box::new(source);
        self
    }

    /// The directory blobs are stored in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The active configuration.
    pub fn config(&self) -> &FsStoreConfig {
        &self.config
    }

    pub(crate) fn payload_path(&self, id: &BlobId) -> PathBuf {
        self.root.join(id.to_string())
    }

    pub(crate) fn metadata_path(&self, id: &BlobId) -> PathBuf {
        self.root.join(format!("{id}{METADATA_SUFFIX}"))
    }

    pub(crate) fn claim_path(&self, id: &BlobId) -> PathBuf {
        self.root.join(format!("{id}{CLAIM_SUFFIX}"))
    }

    pub(crate) fn syncs(&self) -> bool {
        self.config.sync == SyncMode::Always
    }
}

impl OnceStore for FsOnceStore {
    fn allocate(
        &self,
        payload: &mut dyn Read,
        metadata: Metadata,
        max_size: u64,
    ) -> StoreResult<BlobId> {
        self.allocate_blob(payload, &metadata, max_size)
    }

    fn peek(&self, id: &BlobId) -> StoreResult<StoredBlob> {
        self.read_blob(id)
    }

    fn claim(&self, id: &BlobId) -> StoreResult<StoredBlob> {
        self.claim_blob(id)
    }
}

impl std::fmt::Debug for FsOnceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsOnceStore")
            .field("root", &self.root)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Store in a fresh temporary directory, without fsync to keep tests fast.
    pub(crate) fn temp_store() -> (tempfile::TempDir, FsOnceStore) {
        let dir = tempfile::tempdir().unwrap();
        let config = FsStoreConfig {
            sync: SyncMode::OsDefault,
            ..FsStoreConfig::default()
        };
        let store = FsOnceStore::open(dir.path(), config).unwrap();
        (dir, store)
    }

    /// Sorted names of every entry in the store directory.
    pub(crate) fn artifacts(store: &FsOnceStore) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(store.root())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn open_rejects_relative_path() {
        let err = FsOnceStore::open("relative/dir", FsStoreConfig::default()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRoot { .. }));
    }

    #[test]
    fn open_rejects_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let err = FsOnceStore::open(&missing, FsStoreConfig::default()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRoot { .. }));
    }

    #[test]
    fn open_rejects_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, b"not a dir").unwrap();
        let err = FsOnceStore::open(&file, FsStoreConfig::default()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRoot { .. }));
    }

    #[test]
    fn open_leaves_directory_empty() {
        let (_dir, store) = temp_store();
        assert!(artifacts(&store).is_empty());
    }

    #[test]
    fn default_config() {
        let config = FsStoreConfig::default();
        assert_eq!(config.sync, SyncMode::Always);
        assert_eq!(config.max_attempts, 3);
    }

    #[test]
    fn artifact_paths_share_the_identifier() {
        let (_dir, store) = temp_store();
        let id = BlobId::parse("2c8000bc-7c10-4700-9cc3-eb0dce0a9d1a").unwrap();
        let name = |p: PathBuf| p.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(name(store.payload_path(&id)), "2c8000bc-7c10-4700-9cc3-eb0dce0a9d1a");
        assert_eq!(
            name(store.metadata_path(&id)),
            "2c8000bc-7c10-4700-9cc3-eb0dce0a9d1a.json"
        );
        assert_eq!(
            name(store.claim_path(&id)),
            "2c8000bc-7c10-4700-9cc3-eb0dce0a9d1a.lock"
        );
    }
}
