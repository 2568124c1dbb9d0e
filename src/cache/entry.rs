//! Cache Entry Module
//!
//! Snapshot of the filesystem metadata backing one cache entry. The file's
//! size decides presence and its modification time decides expiry.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};

// == Entry Metadata ==
/// Size and modification time of an entry's backing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMeta {
    /// File length in bytes
    pub len: u64,
    /// Last modification time, None if the platform could not report it
    pub modified: Option<SystemTime>,
}

impl EntryMeta {
    // == Read ==
    /// Reads the metadata of the file at `path`.
    ///
    /// Returns `None` if nothing exists there or the path is not a regular file.
    pub fn read(path: &Path) -> Option<Self> {
        let metadata = fs::metadata(path).ok()?;
        if !metadata.is_file() {
            return None;
        }

        Some(Self {
            len: metadata.len(),
            modified: metadata.modified().ok(),
        })
    }

    // == Is Present ==
    /// A zero-byte file counts as absent.
    pub fn is_present(&self) -> bool {
        self.len > 0
    }

    // == Age ==
    /// Returns the entry's age in whole seconds at `now`.
    ///
    /// # Returns
    /// - `Some(age)` if the modification time is known and not in the future
    /// - `None` otherwise
    pub fn age_secs(&self, now: SystemTime) -> Option<u64> {
        let modified = self.modified?;
        now.duration_since(modified).ok().map(|age| age.as_secs())
    }

    // == Is Older Than ==
    /// Checks whether the entry's age strictly exceeds `threshold_secs`.
    ///
    /// An unknown age is never considered expired.
    pub fn is_older_than(&self, threshold_secs: u64, now: SystemTime) -> bool {
        matches!(self.age_secs(now), Some(age) if age > threshold_secs)
    }

    // == Modified At ==
    /// Returns the modification time as a UTC timestamp.
    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.modified.map(DateTime::<Utc>::from)
    }
}
