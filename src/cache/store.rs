//! File Cache Store Module
//!
//! Main cache engine: one JSON file per key, expiry read from the file's
//! modification time.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::cache::{ensure_finite, entry_file_name, EntryMeta, DEFAULT_TTL_SECS};
use crate::config::Config;
use crate::error::{CacheError, Result};

// == File Cache ==
/// File-backed key/value cache with TTL expiry.
///
/// Entries live at `<cache_dir>/<key>.txt`. Nothing is kept in memory; every
/// call asks the filesystem. Expiry is advisory: expired files stay on disk
/// until overwritten or removed.
#[derive(Debug, Clone)]
pub struct FileCache {
    /// Directory holding the entry files
    cache_dir: PathBuf,
    /// Default TTL in seconds
    ttl: u64,
}

impl FileCache {
    // == Constructors ==
    /// Creates a cache over `cache_dir` with the default TTL of one hour.
    ///
    /// The directory is not created or checked.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self::with_ttl(cache_dir, DEFAULT_TTL_SECS)
    }

    /// Creates a cache over `cache_dir` with an explicit default TTL in seconds.
    pub fn with_ttl(cache_dir: impl Into<PathBuf>, ttl: u64) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ttl,
        }
    }

    /// Creates a cache from configuration, creating the directory if missing.
    pub fn from_config(config: &Config) -> Result<Self> {
        fs::create_dir_all(&config.cache_dir)?;
        info!(
            "File cache ready at {} (default_ttl={}s)",
            config.cache_dir.display(),
            config.default_ttl
        );
        Ok(Self::with_ttl(&config.cache_dir, config.default_ttl))
    }

    // == Accessors ==
    /// Directory holding the entry files.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Current default TTL in seconds.
    pub fn ttl(&self) -> u64 {
        self.ttl
    }

    /// Path of the file backing `key`, or `None` if the key is invalid.
    pub fn entry_path(&self, key: &str) -> Option<PathBuf> {
        self.checked_path(key).ok()
    }

    // == Set Timeout ==
    /// Replaces the default TTL used by `is_expired(key, 0)` and `retrieve`.
    pub fn set_timeout(&mut self, ttl: u64) {
        debug!("Default TTL changed from {}s to {}s", self.ttl, ttl);
        self.ttl = ttl;
    }

    // == Is Stored ==
    /// Returns true if the entry's file exists and is not empty.
    pub fn is_stored(&self, key: &str) -> bool {
        self.meta(key).is_some_and(|meta| meta.is_present())
    }

    // == Is Expired ==
    /// Checks whether the entry is older than `time_diff` seconds.
    ///
    /// A `time_diff` of zero uses the configured TTL. A missing entry, or one
    /// whose modification time cannot be read, is reported as not expired, so
    /// pair this with `is_stored` to tell absent from fresh.
    ///
    /// # Arguments
    /// * `key` - The cache key
    /// * `time_diff` - Maximum age in seconds, 0 for the default TTL
    pub fn is_expired(&self, key: &str, time_diff: u64) -> bool {
        let threshold = if time_diff == 0 { self.ttl } else { time_diff };
        self.meta(key)
            .is_some_and(|meta| meta.is_older_than(threshold, SystemTime::now()))
    }

    // == Retrieve ==
    /// Reads and decodes the value stored under `key`.
    ///
    /// Returns `None` if the entry is absent, if `check_expiration` is set and
    /// the entry is older than the default TTL, or if the file cannot be read
    /// or decoded as `T`.
    ///
    /// # Arguments
    /// * `key` - The cache key
    /// * `check_expiration` - Whether an expired entry counts as a miss
    pub fn retrieve<T: DeserializeOwned>(&self, key: &str, check_expiration: bool) -> Option<T> {
        if !self.is_stored(key) {
            debug!("Cache miss: {}", key);
            return None;
        }
        if check_expiration && self.is_expired(key, 0) {
            debug!("Cache entry expired: {}", key);
            return None;
        }

        let path = self.checked_path(key).ok()?;
        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read cache file {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_slice(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Failed to decode cache file {}: {}", path.display(), e);
                None
            }
        }
    }

    // == Store ==
    /// Encodes `value` as JSON and writes it to the entry's file, replacing any
    /// previous content.
    ///
    /// The value is encoded before the file is opened, so a value that cannot
    /// be encoded leaves an existing entry untouched. The cache directory must
    /// already exist.
    ///
    /// # Errors
    /// - `InvalidKey` if the key fails validation
    /// - `InvalidValue` if the value cannot be encoded as JSON or holds a
    ///   NaN or infinite float
    /// - `Unwritable` if the file cannot be opened, written or synced
    pub fn store<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let path = self.checked_path(key)?;
        ensure_finite(value).map_err(CacheError::InvalidValue)?;
        let encoded = serde_json::to_vec(value).map_err(CacheError::InvalidValue)?;

        write_entry(&path, &encoded).map_err(|source| {
            warn!("Failed to write cache file {}: {}", path.display(), source);
            CacheError::Unwritable { path, source }
        })
    }

    // == Remove ==
    /// Deletes the entry's file.
    ///
    /// Returns `Ok(true)` if a file was removed and `Ok(false)` if there was
    /// nothing to remove.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let path = self.checked_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Removed cache entry: {}", key);
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::Io(e)),
        }
    }

    // == Modified At ==
    /// Returns when the entry was last written, or `None` if it is absent.
    pub fn modified_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.meta(key)?.modified_at()
    }

    // == Helpers ==
    fn checked_path(&self, key: &str) -> Result<PathBuf> {
        let file_name = entry_file_name(key).inspect_err(|_| {
            debug!("Rejected cache key: {:?}", key);
        })?;
        Ok(self.cache_dir.join(file_name))
    }

    fn meta(&self, key: &str) -> Option<EntryMeta> {
        EntryMeta::read(&self.checked_path(key).ok()?)
    }
}

/// Truncates and writes `path`, then syncs so a failed flush is reported.
fn write_entry(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content)?;
    file.sync_all()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;
    use serde::{Deserialize, Serializer};
    use std::collections::HashMap;
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Product {
        id: u32,
        name: String,
        price_cents: i64,
    }

    /// Stand-in for a live OS handle: refuses to serialize.
    struct OpenHandle;

    impl Serialize for OpenHandle {
        fn serialize<S: Serializer>(&self, _serializer: S) -> std::result::Result<S::Ok, S::Error> {
            Err(S::Error::custom("cannot serialize a live handle"))
        }
    }

    fn create_test_cache() -> (FileCache, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache = FileCache::new(temp_dir.path());
        (cache, temp_dir)
    }

    fn age_entry(cache: &FileCache, key: &str, age: Duration) {
        let path = cache.entry_path(key).unwrap();
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[test]
    fn test_new_uses_default_ttl() {
        let (cache, _dir) = create_test_cache();
        assert_eq!(cache.ttl(), DEFAULT_TTL_SECS);
    }

    #[test]
    fn test_store_writes_json_file() {
        let (cache, dir) = create_test_cache();
        let product = Product {
            id: 7,
            name: "Mug".to_string(),
            price_cents: 1299,
        };

        cache.store("product_7", &product).unwrap();

        let content = fs::read_to_string(dir.path().join("product_7.txt")).unwrap();
        assert_eq!(content, r#"{"id":7,"name":"Mug","price_cents":1299}"#);
    }

    #[test]
    fn test_store_and_retrieve() {
        let (cache, _dir) = create_test_cache();
        let product = Product {
            id: 1,
            name: "Lamp".to_string(),
            price_cents: 4500,
        };

        cache.store("product_1", &product).unwrap();

        assert!(cache.is_stored("product_1"));
        assert_eq!(cache.retrieve::<Product>("product_1", true), Some(product));
    }

    #[test]
    fn test_unknown_key_is_absent_and_not_expired() {
        let (cache, _dir) = create_test_cache();

        assert!(!cache.is_stored("nothing"));
        assert!(!cache.is_expired("nothing", 0));
        assert_eq!(cache.retrieve::<String>("nothing", false), None);
    }

    #[test]
    fn test_missing_directory_is_absent() {
        let (_, dir) = create_test_cache();
        let cache = FileCache::new(dir.path().join("not").join("there"));

        assert!(!cache.is_stored("key"));
        assert!(!cache.is_expired("key", 0));
    }

    #[test]
    fn test_store_into_missing_directory_fails() {
        let (_, dir) = create_test_cache();
        let cache = FileCache::new(dir.path().join("missing"));

        let result = cache.store("key", "value");
        assert!(matches!(result, Err(CacheError::Unwritable { .. })));
    }

    #[test]
    fn test_zero_byte_file_is_not_stored() {
        let (cache, dir) = create_test_cache();
        fs::write(dir.path().join("empty.txt"), "").unwrap();

        assert!(!cache.is_stored("empty"));
        assert_eq!(cache.retrieve::<String>("empty", false), None);
    }

    #[test]
    fn test_empty_values_are_stored() {
        let (cache, _dir) = create_test_cache();

        cache.store("empty_string", "").unwrap();
        cache.store("empty_list", &Vec::<u32>::new()).unwrap();

        assert!(cache.is_stored("empty_string"));
        assert!(cache.is_stored("empty_list"));
        assert_eq!(cache.retrieve::<String>("empty_string", true), Some(String::new()));
        assert_eq!(cache.retrieve::<Vec<u32>>("empty_list", true), Some(vec![]));
    }

    #[test]
    fn test_store_overwrites() {
        let (cache, _dir) = create_test_cache();

        cache.store("key", &vec![1, 2, 3]).unwrap();
        cache.store("key", &vec![4]).unwrap();

        assert_eq!(cache.retrieve::<Vec<i32>>("key", true), Some(vec![4]));
    }

    #[test]
    fn test_store_unserializable_value_keeps_previous_entry() {
        let (cache, dir) = create_test_cache();
        cache.store("session", "previous").unwrap();

        let result = cache.store("session", &OpenHandle);

        assert!(matches!(result, Err(CacheError::InvalidValue(_))));
        let content = fs::read_to_string(dir.path().join("session.txt")).unwrap();
        assert_eq!(content, r#""previous""#);
    }

    #[test]
    fn test_store_non_finite_floats_keep_previous_entry() {
        let (cache, dir) = create_test_cache();
        cache.store("price", &19.99).unwrap();
        cache.store("rates", &vec![1.5, 2.0]).unwrap();

        let nan = cache.store("price", &f64::NAN);
        let inf = cache.store("rates", &vec![1.5, f64::INFINITY]);

        assert!(matches!(nan, Err(CacheError::InvalidValue(_))));
        assert!(matches!(inf, Err(CacheError::InvalidValue(_))));
        assert_eq!(fs::read_to_string(dir.path().join("price.txt")).unwrap(), "19.99");
        assert_eq!(fs::read_to_string(dir.path().join("rates.txt")).unwrap(), "[1.5,2.0]");
        assert_eq!(cache.retrieve::<f64>("price", true), Some(19.99));
        assert_eq!(cache.retrieve::<Vec<f64>>("rates", true), Some(vec![1.5, 2.0]));
    }

    #[test]
    fn test_store_non_finite_float_creates_no_entry() {
        let (cache, _dir) = create_test_cache();

        let result = cache.store("ratio", &f32::NEG_INFINITY);

        assert!(matches!(result, Err(CacheError::InvalidValue(_))));
        assert!(!cache.is_stored("ratio"));
    }

    #[test]
    fn test_store_non_string_map_keys_rejected() {
        let (cache, _dir) = create_test_cache();
        let mut map = HashMap::new();
        map.insert(vec![1u8], "x");

        let result = cache.store("map", &map);

        assert!(matches!(result, Err(CacheError::InvalidValue(_))));
        assert!(!cache.is_stored("map"));
    }

    #[test]
    fn test_store_invalid_key_rejected() {
        let (cache, dir) = create_test_cache();

        let result = cache.store("../escape", "value");

        assert!(matches!(result, Err(CacheError::InvalidKey(_))));
        assert!(!dir.path().parent().unwrap().join("escape.txt").exists());
    }

    #[test]
    fn test_fresh_entry_not_expired() {
        let (cache, _dir) = create_test_cache();
        cache.store("fresh", &42).unwrap();

        assert!(!cache.is_expired("fresh", 0));
        assert!(!cache.is_expired("fresh", 1));
    }

    #[test]
    fn test_aged_entry_expired_but_still_stored() {
        let (cache, _dir) = create_test_cache();
        cache.store("old", &42).unwrap();
        age_entry(&cache, "old", Duration::from_secs(DEFAULT_TTL_SECS + 10));

        assert!(cache.is_expired("old", 0));
        assert!(cache.is_stored("old"));
        assert_eq!(cache.retrieve::<i32>("old", true), None);
        assert_eq!(cache.retrieve::<i32>("old", false), Some(42));
    }

    #[test]
    fn test_explicit_time_diff_overrides_ttl() {
        let (cache, _dir) = create_test_cache();
        cache.store("key", &1).unwrap();
        age_entry(&cache, "key", Duration::from_secs(120));

        assert!(cache.is_expired("key", 60));
        assert!(!cache.is_expired("key", 600));
        assert!(!cache.is_expired("key", 0));
    }

    #[test]
    fn test_set_timeout_changes_default_threshold() {
        let (mut cache, _dir) = create_test_cache();
        cache.store("key", &1).unwrap();
        age_entry(&cache, "key", Duration::from_secs(120));

        cache.set_timeout(60);

        assert_eq!(cache.ttl(), 60);
        assert!(cache.is_expired("key", 0));
        assert!(!cache.is_expired("key", 600));
        assert_eq!(cache.retrieve::<i32>("key", true), None);
    }

    #[test]
    fn test_retrieve_undecodable_content() {
        let (cache, dir) = create_test_cache();
        fs::write(dir.path().join("broken.txt"), "{not json").unwrap();

        assert!(cache.is_stored("broken"));
        assert_eq!(cache.retrieve::<Product>("broken", false), None);
    }

    #[test]
    fn test_retrieve_type_mismatch() {
        let (cache, _dir) = create_test_cache();
        cache.store("number", &5).unwrap();

        assert_eq!(cache.retrieve::<Product>("number", false), None);
    }

    #[test]
    fn test_remove() {
        let (cache, _dir) = create_test_cache();
        cache.store("key", "value").unwrap();

        assert!(cache.remove("key").unwrap());
        assert!(!cache.is_stored("key"));
        assert!(!cache.remove("key").unwrap());
        assert!(matches!(cache.remove("a/b"), Err(CacheError::InvalidKey(_))));
    }

    #[test]
    fn test_modified_at() {
        let (cache, _dir) = create_test_cache();
        assert!(cache.modified_at("key").is_none());

        let before = Utc::now() - chrono::Duration::seconds(2);
        cache.store("key", "value").unwrap();

        let modified = cache.modified_at("key").unwrap();
        assert!(modified >= before);
        assert!(modified <= Utc::now() + chrono::Duration::seconds(2));
    }

    #[test]
    fn test_from_config_creates_directory() {
        let (_, dir) = create_test_cache();
        let config = Config {
            cache_dir: dir.path().join("nested").join("cache"),
            default_ttl: 90,
        };

        let cache = FileCache::from_config(&config).unwrap();

        assert!(config.cache_dir.is_dir());
        assert_eq!(cache.ttl(), 90);
        assert_eq!(cache.cache_dir(), config.cache_dir.as_path());
        cache.store("key", "value").unwrap();
    }

    #[test]
    fn test_entry_path_joins_directory() {
        let (cache, dir) = create_test_cache();

        assert_eq!(cache.entry_path("orders"), Some(dir.path().join("orders.txt")));
        assert_eq!(cache.entry_path(".."), None);
    }
}
