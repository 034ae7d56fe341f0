//! File-backed local cache.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::record::{validate_collection_name, Collection, InvalidCollectionName};

use super::{COLLECTION_PREFIX, SHIFT_ACTIVE_KEY};

/// Errors that can occur during local cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// I/O error reading or writing a file.
    #[error("I/O error for {path}: {1}", path = .0.display())]
    Io(PathBuf, #[source] io::Error),
    /// A cache file exists but does not hold a valid collection.
    #[error("Corrupt cache entry {path}: {1}", path = .0.display())]
    Corrupt(PathBuf, #[source] serde_json::Error),
    /// Collection or scalar name that cannot be stored.
    #[error(transparent)]
    InvalidName(#[from] InvalidCollectionName),
}

/// Durable per-device store for collections and a few scalars.
///
/// Every write goes to a temp file first and is renamed into place, so a
/// reader sees either the previous value or the new one.
#[derive(Debug, Clone)]
pub struct LocalCache {
    data_dir: PathBuf,
}

impl LocalCache {
    /// Creates a cache rooted at `data_dir`. The directory is created on
    /// first write.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Returns the file path for a collection.
    pub fn collection_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}{}.json", COLLECTION_PREFIX, name))
    }

    fn scalar_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(key)
    }

    /// Reads a collection.
    ///
    /// Returns `Ok(None)` if the collection was never written, which is
    /// distinct from `Ok(Some(vec![]))`.
    pub fn read_collection(&self, name: &str) -> Result<Option<Collection>, CacheError> {
        validate_collection_name(name)?;
        let path = self.collection_path(name);

        match fs::read(&path) {
            Ok(bytes) => {
                let records = serde_json::from_slice(&bytes)
                    .map_err(|e| CacheError::Corrupt(path, e))?;
                Ok(Some(records))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Io(path, e)),
        }
    }

    /// Overwrites a collection.
    pub fn write_collection(&self, name: &str, records: &Collection) -> Result<(), CacheError> {
        validate_collection_name(name)?;
        let path = self.collection_path(name);
        let bytes = serde_json::to_vec(records).map_err(|e| CacheError::Corrupt(path.clone(), e))?;
        self.write_atomic(&path, &bytes)
    }

    /// Lists the collections present in the cache, sorted by name.
    pub fn collections(&self) -> Result<Vec<String>, CacheError> {
        let entries = match fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CacheError::Io(self.data_dir.clone(), e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::Io(self.data_dir.clone(), e))?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(name) = file_name
                .strip_prefix(COLLECTION_PREFIX)
                .and_then(|rest| rest.strip_suffix(".json"))
            {
                if validate_collection_name(name).is_ok() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Reads a scalar entry.
    pub fn read_scalar(&self, key: &str) -> Result<Option<String>, CacheError> {
        validate_collection_name(key)?;
        let path = self.scalar_path(key);

        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Io(path, e)),
        }
    }

    /// Overwrites a scalar entry.
    pub fn write_scalar(&self, key: &str, value: &str) -> Result<(), CacheError> {
        validate_collection_name(key)?;
        let path = self.scalar_path(key);
        self.write_atomic(&path, value.as_bytes())
    }

    /// Removes a scalar entry. Removing a missing entry is not an error.
    pub fn remove_scalar(&self, key: &str) -> Result<(), CacheError> {
        validate_collection_name(key)?;
        let path = self.scalar_path(key);

        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Io(path, e)),
        }
    }

    /// Whether a reader shift is currently open on this device.
    pub fn shift_active(&self) -> Result<bool, CacheError> {
        Ok(self
            .read_scalar(SHIFT_ACTIVE_KEY)?
            .map(|v| v.trim() == "true")
            .unwrap_or(false))
    }

    pub fn set_shift_active(&self, active: bool) -> Result<(), CacheError> {
        self.write_scalar(SHIFT_ACTIVE_KEY, if active { "true" } else { "false" })
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| CacheError::Io(self.data_dir.clone(), e))?;

        let temp_path = path.with_extension("tmp");

        let mut file =
            File::create(&temp_path).map_err(|e| CacheError::Io(temp_path.clone(), e))?;
        file.write_all(bytes)
            .map_err(|e| CacheError::Io(temp_path.clone(), e))?;
        file.sync_all()
            .map_err(|e| CacheError::Io(temp_path.clone(), e))?;

        fs::rename(&temp_path, path).map_err(|e| CacheError::Io(path.to_path_buf(), e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SYNC_CURSOR_KEY;
    use crate::record::Record;
    use tempfile::TempDir;

    fn test_cache() -> (LocalCache, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let cache = LocalCache::new(temp_dir.path());
        (cache, temp_dir)
    }

    #[test]
    fn test_collection_path() {
        let (cache, _temp) = test_cache();
        assert!(cache.collection_path("houses").ends_with("db_houses.json"));
    }

    #[test]
    fn test_read_missing_collection_is_absent() {
        let (cache, _temp) = test_cache();
        assert!(cache.read_collection("houses").unwrap().is_none());
    }

    #[test]
    fn test_empty_collection_is_not_absent() {
        let (cache, _temp) = test_cache();
        cache.write_collection("houses", &Vec::new()).unwrap();

        let loaded = cache.read_collection("houses").unwrap();
        assert_eq!(loaded, Some(Vec::new()));
    }

    #[test]
    fn test_write_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested").join("device");
        let cache = LocalCache::new(nested.clone());

        cache
            .write_collection("users", &vec![Record::with_id("u2")])
            .unwrap();

        assert!(nested.join("db_users.json").exists());
    }

    #[test]
    fn test_overwrite_collection() {
        let (cache, _temp) = test_cache();
        cache
            .write_collection("houses", &vec![Record::with_id("a"), Record::with_id("b")])
            .unwrap();
        cache
            .write_collection("houses", &vec![Record::with_id("b")])
            .unwrap();

        let loaded = cache.read_collection("houses").unwrap().unwrap();
        assert_eq!(loaded, vec![Record::with_id("b")]);
        assert!(!cache.collection_path("houses").with_extension("tmp").exists());
    }

    #[test]
    fn test_corrupt_collection_is_an_error() {
        let (cache, _temp) = test_cache();
        std::fs::write(cache.collection_path("houses"), b"{not json").unwrap();

        let result = cache.read_collection("houses");
        assert!(matches!(result, Err(CacheError::Corrupt(_, _))));
    }

    #[test]
    fn test_invalid_name_rejected() {
        let (cache, _temp) = test_cache();
        assert!(matches!(
            cache.read_collection("../secrets"),
            Err(CacheError::InvalidName(_))
        ));
        assert!(matches!(
            cache.write_collection("", &Vec::new()),
            Err(CacheError::InvalidName(_))
        ));
    }

    #[test]
    fn test_collections_lists_written_names() {
        let (cache, _temp) = test_cache();
        assert!(cache.collections().unwrap().is_empty());

        cache.write_collection("users", &Vec::new()).unwrap();
        cache.write_collection("houses", &Vec::new()).unwrap();
        cache.write_scalar(SYNC_CURSOR_KEY, "123").unwrap();

        assert_eq!(cache.collections().unwrap(), vec!["houses", "users"]);
    }

    #[test]
    fn test_scalar_roundtrip_and_remove() {
        let (cache, _temp) = test_cache();
        assert_eq!(cache.read_scalar(SYNC_CURSOR_KEY).unwrap(), None);

        cache.write_scalar(SYNC_CURSOR_KEY, "1767225600000").unwrap();
        assert_eq!(
            cache.read_scalar(SYNC_CURSOR_KEY).unwrap().as_deref(),
            Some("1767225600000")
        );

        cache.remove_scalar(SYNC_CURSOR_KEY).unwrap();
        cache.remove_scalar(SYNC_CURSOR_KEY).unwrap();
        assert_eq!(cache.read_scalar(SYNC_CURSOR_KEY).unwrap(), None);
    }

    #[test]
    fn test_shift_flag() {
        let (cache, _temp) = test_cache();
        assert!(!cache.shift_active().unwrap());

        cache.set_shift_active(true).unwrap();
        assert!(cache.shift_active().unwrap());

        cache.set_shift_active(false).unwrap();
        assert!(!cache.shift_active().unwrap());
    }

    #[test]
    fn test_cache_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let cache = LocalCache::new(temp_dir.path());
            cache
                .write_collection("readings", &vec![Record::with_id("R-001")])
                .unwrap();
        }

        let reopened = LocalCache::new(temp_dir.path());
        let loaded = reopened.read_collection("readings").unwrap().unwrap();
        assert_eq!(loaded[0].id(), Some("R-001"));
    }
}
