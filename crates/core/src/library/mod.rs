//! On-disk library cache.
//!
//! A read-through in-memory index of the music library on disk
//! (artists -> releases -> tracks). Rebuilt by full re-scan through a
//! [`LibraryReader`]; queried by everything else. Readers always see either
//! the previous snapshot or the new one, never a half-built mix.

mod cache;
mod reader;
mod types;

pub use cache::LibraryCache;
pub use reader::{FsLibraryReader, LibraryReader};
pub use types::*;

use thiserror::Error;

/// Errors from library reads and cache rebuilds.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Filesystem-level failure.
    #[error("library read error: {0}")]
    Read(String),

    /// A descriptor file could not be parsed.
    #[error("failed to parse descriptor {path}: {message}")]
    Parse { path: String, message: String },
}
