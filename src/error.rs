//! Error types for the file cache
//!
//! Provides unified error handling using thiserror.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the file cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key contains characters that cannot form a safe file name
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),

    /// Value cannot be encoded as JSON
    #[error("Invalid value: {0}")]
    InvalidValue(#[source] serde_json::Error),

    /// Backing file could not be opened, written or synced
    #[error("Cannot write cache file {}: {source}", path.display())]
    Unwritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Any other filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the file cache.
pub type Result<T> = std::result::Result<T, CacheError>;
