//! Foundation types for YODO ("You Only Download Once").
//!
//! Every other YODO crate depends on `yodo-types`.
//!
//! # Key Types
//!
//! - [`BlobId`] — random version-4 UUID handle for a single-use blob
//! - [`TypeError`] — parse failures for externally supplied identifiers

pub mod error;
pub mod id;

pub use error::TypeError;
pub use id::BlobId;
