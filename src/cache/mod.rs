//! Cache Module
//!
//! Provides a file-backed key/value cache with modification-time TTL expiry.

mod entry;
mod finite;
mod key;
mod store;


// Re-export public types
pub use entry::EntryMeta;
pub use finite::ensure_finite;
pub use key::{entry_file_name, validate_key};
pub use store::FileCache;

// == Public Constants ==
/// Maximum allowed key length in bytes, leaving room for the suffix in a
/// 255-byte file name
pub const MAX_KEY_LENGTH: usize = 200;

/// Default TTL in seconds
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Extension appended to every key to form its file name
pub const ENTRY_EXTENSION: &str = "txt";
