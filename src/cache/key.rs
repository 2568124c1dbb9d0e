//! Cache Key Module
//!
//! Maps caller keys onto file names, rejecting anything that could escape the
//! cache directory.

use crate::cache::{ENTRY_EXTENSION, MAX_KEY_LENGTH};
use crate::error::{CacheError, Result};

// == Validate Key ==
/// Checks a key against the allow-list.
///
/// A valid key is non-empty, at most `MAX_KEY_LENGTH` bytes, made only of
/// ASCII letters, digits, `_`, `-` and `.`, and does not start with `.`.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || key.len() > MAX_KEY_LENGTH || key.starts_with('.') {
        return Err(CacheError::InvalidKey(key.to_string()));
    }

    let allowed = key
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'));
    if !allowed {
        return Err(CacheError::InvalidKey(key.to_string()));
    }

    Ok(())
}

// == Entry File Name ==
/// Returns the file name backing `key`, e.g. `products_42.txt`.
pub fn entry_file_name(key: &str) -> Result<String> {
    validate_key(key)?;
    Ok(format!("{}.{}", key, ENTRY_EXTENSION))
}
