//! Local key/value persistence.
//!
//! Each key is stored as one JSON file in the storage directory:
//! ```text
//! <STORAGE_DIR>/
//!   imran-template-config-v1.json
//!   imran-dev-credentials-v1.json
//! ```
//!
//! Writes go to a temp file first and are renamed into place, so a value is
//! always either the old or the new blob, never a partial one.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::StoreError;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Rejects keys that could escape the storage directory.
    fn validate_key(key: &str) -> Result<(), StoreError> {
        if key.is_empty()
            || key.contains('/')
            || key.contains('\\')
            || key.contains("..")
            || key.starts_with('.')
        {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(())
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Reads the raw value stored under `key`, `None` when absent.
    pub fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Self::validate_key(key)?;
        let path = self.path(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(path, e)),
        }
    }

    /// Replaces the value stored under `key`.
    pub fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        Self::validate_key(key)?;
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::Io(self.dir.clone(), e))?;

        let path = self.path(key);
        let temp_path = path.with_extension("json.tmp");

        let mut file =
            fs::File::create(&temp_path).map_err(|e| StoreError::Io(temp_path.clone(), e))?;
        file.write_all(value.as_bytes())
            .map_err(|e| StoreError::Io(temp_path.clone(), e))?;
        file.sync_all()
            .map_err(|e| StoreError::Io(temp_path.clone(), e))?;

        fs::rename(&temp_path, &path).map_err(|e| StoreError::Io(path, e))?;
        Ok(())
    }

    /// Deletes the value under `key`; a missing key is not an error.
    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        Self::validate_key(key)?;
        let path = self.path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(path, e)),
        }
    }
}
