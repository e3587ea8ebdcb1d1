//! Low-level filesystem operations the store protocol is built from.
//!
//! Exclusive creation is the only synchronisation primitive: it must map to
//! `O_CREAT | O_EXCL` so that exactly one caller can create a given path.
//! Never replace it with an existence check followed by a create.

use std::fs::{self, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

/// Chunk size used when streaming payloads.
pub(crate) const COPY_BUF_SIZE: usize = 64 * 1024;

/// Atomically create an empty file at `path`.
///
/// Fails with [`io::ErrorKind::AlreadyExists`] if anything is already there.
pub(crate) fn exclusive_create(path: &Path) -> io::Result<()> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map(drop)
}

/// Remove `path`, ignoring every error. A missing file is not an error.
pub(crate) fn try_remove(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "best-effort remove failed"),
    }
}

/// Flush directory entries (creates and renames) to stable storage.
#[cfg(unix)]
pub(crate) fn sync_dir(path: &Path) -> io::Result<()> {
    fs::File::open(path)?.sync_all()
}

#[cfg(not(unix))]
pub(crate) fn sync_dir(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Stream `reader` into `writer`, refusing to go past `max_size` bytes.
///
/// Read failures are reported as [`StoreError::UpstreamRead`], write failures
/// as [`StoreError::StorageExhausted`]. Returns the number of bytes copied.
pub(crate) fn copy_bounded(
    reader: &mut dyn Read,
    writer: &mut dyn Write,
    max_size: u64,
) -> StoreResult<u64> {
    let mut buf = vec![0u8; COPY_BUF_SIZE];
    let mut total: u64 = 0;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(StoreError::UpstreamRead(e)),
        };
        total += n as u64;
        if total > max_size {
            debug!(limit = max_size, "payload over limit; aborting copy");
            return Err(StoreError::PayloadTooLarge { limit: max_size });
        }
        writer
            .write_all(&buf[..n])
            .map_err(|e| StoreError::exhausted(format!("failed to write payload: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| StoreError::exhausted(format!("failed to flush payload: {e}")))?;
    Ok(total)
}
