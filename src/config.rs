//! Configuration Module
//!
//! Handles loading the cache location and default TTL from environment variables.

use std::env;
use std::path::PathBuf;

use crate::cache::DEFAULT_TTL_SECS;

/// File cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding one file per cache entry
    pub cache_dir: PathBuf,
    /// Default TTL in seconds for expiry checks without an explicit threshold
    pub default_ttl: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `FILE_CACHE_DIR` - Cache directory (default: `<temp dir>/file_cache`)
    /// - `FILE_CACHE_TTL` - Default TTL in seconds (default: 3600)
    pub fn from_env() -> Self {
        Self {
            cache_dir: env::var_os("FILE_CACHE_DIR")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(default_cache_dir),
            default_ttl: env::var("FILE_CACHE_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TTL_SECS),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            default_ttl: DEFAULT_TTL_SECS,
        }
    }
}

fn default_cache_dir() -> PathBuf {
    env::temp_dir().join("file_cache")
}
