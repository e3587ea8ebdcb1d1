//! Single-delivery blob storage for YODO.
//!
//! A client uploads a payload once and gets back a random [`BlobId`]; exactly
//! one later retrieval returns the payload and destroys it. Every other
//! retrieval, whether concurrent or later, sees [`StoreError::NotFound`].
//!
//! # Lifecycle
//!
//! ```text
//! ABSENT --allocate--> COMMITTED --claim--> CLAIMED --(same call)--> ABSENT
//!                          |
//!                          +-- peek (read-only, repeatable)
//! ```
//!
//! # Storage Backends
//!
//! All backends implement the [`OnceStore`] trait:
//!
//! - [`FsOnceStore`] -- one flat directory, coordinated purely through
//!   exclusive file creation and rename, safe across processes
//! - [`InMemoryOnceStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Identifiers are never reused. An allocation either commits fully or
//!    leaves nothing behind.
//! 2. Exclusive creation of a claim marker is the only arbitration point for
//!    destructive reads.
//! 3. Claim cleanup runs on every exit path.
//! 4. "Never existed", "already claimed" and "unreadable" are one outcome.
//! 5. Best-effort cleanup errors are swallowed; commit errors are surfaced.

mod allocator;
mod consumer;
mod primitives;

pub mod error;
pub mod fs;
pub mod memory;
pub mod object;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use fs::{FsOnceStore, FsStoreConfig, SyncMode};
pub use memory::InMemoryOnceStore;
pub use object::{Metadata, StoredBlob, FALLBACK_CONTENT_TYPE};
pub use traits::OnceStore;
pub use yodo_types::BlobId;
