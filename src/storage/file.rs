//! Directory-backed store, one file per key

use parking_lot::Mutex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{AppError, Result};
use crate::storage::KeyValueStore;

/// Store persisting each key as `<dir>/<key>.json`
pub struct FileStore {
    storage_path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Open a store rooted at `storage_path`, creating the directory if needed
    pub fn open(storage_path: impl Into<PathBuf>) -> Result<Self> {
        let storage_path = storage_path.into();
        if !storage_path.exists() {
            fs::create_dir_all(&storage_path)?;
            debug!(path = ?storage_path, "Created storage directory");
        }

        Ok(Self {
            storage_path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(AppError::Storage(format!("Invalid storage key '{}'", key)));
        }
        Ok(self.storage_path.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        let _guard = self.lock.lock();

        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        let tmp = path.with_extension("json.tmp");
        let _guard = self.lock.lock();

        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        debug!(path = ?path, size = value.len(), "Stored entry");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key)?;
        let _guard = self.lock.lock();

        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}
