//! File Cache - A minimal file-backed key/value cache
//!
//! Stores JSON-encoded values in one file per key and reports staleness from
//! each file's modification time.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::FileCache;
pub use config::Config;
pub use error::{CacheError, Result};
