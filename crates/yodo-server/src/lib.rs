//! HTTP front end for YODO.
//!
//! Accepts uploads (raw bodies or multipart forms), answers with a one-time
//! URL, and serves each upload to exactly one `GET`. All storage semantics
//! live in `yodo-store`; this crate only maps HTTP onto it.

pub mod config;
pub mod error;
pub mod handler;
pub mod headers;
pub mod router;
pub mod server;
mod upload;

pub use config::{ServerConfig, DEFAULT_MAX_CONTENT_LENGTH};
pub use error::{ServerError, ServerResult};
pub use handler::AppState;
pub use server::YodoServer;
