//! In-memory storage backend
//!
//! Keeps files in a map keyed by normalized path. Directories are implicit:
//! a directory exists when it was created explicitly or when any file lives
//! beneath it.

use super::{StorageBackend, StorageError};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

/// Storage backend that never touches the disk
#[derive(Debug, Default)]
pub struct MemoryStorageBackend {
    files: RwLock<BTreeMap<String, Vec<u8>>>,
    dirs: RwLock<BTreeSet<String>>,
}

fn normalize(path: &str) -> Result<String, StorageError> {
    let trimmed = path.trim_matches('/');
    if trimmed.split('/').any(|segment| segment == "..") {
        return Err(StorageError::PermissionDenied(
            "Path traversal (..) not allowed".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn poisoned() -> StorageError {
    StorageError::IoError("memory storage lock poisoned".to_string())
}

impl MemoryStorageBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files currently stored
    pub fn len(&self) -> usize {
        self.files.read().map(|files| files.len()).unwrap_or(0)
    }

    /// Whether no files are stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All stored paths, sorted
    pub fn paths(&self) -> Vec<String> {
        self.files
            .read()
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait(?Send)]
impl StorageBackend for MemoryStorageBackend {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let key = normalize(path)?;
        let files = self.files.read().map_err(|_| poisoned())?;
        files
            .get(&key)
            .cloned()
            .ok_or_else(|| StorageError::FileNotFound(path.to_string()))
    }

    async fn write_file(&self, path: &str, content: &[u8]) -> Result<(), StorageError> {
        let key = normalize(path)?;
        if key.is_empty() {
            return Err(StorageError::IoError("Empty file path".to_string()));
        }
        let mut files = self.files.write().map_err(|_| poisoned())?;
        files.insert(key, content.to_vec());
        Ok(())
    }

    async fn list_files(&self, dir: &str) -> Result<Vec<String>, StorageError> {
        let prefix = normalize(dir)?;
        if !self.dir_exists(dir).await? {
            return Err(StorageError::DirectoryNotFound(dir.to_string()));
        }
        let files = self.files.read().map_err(|_| poisoned())?;
        let entries = files
            .keys()
            .filter_map(|key| {
                let rest = if prefix.is_empty() {
                    key.as_str()
                } else {
                    key.strip_prefix(&prefix)?.strip_prefix('/')?
                };
                (!rest.contains('/')).then(|| rest.to_string())
            })
            .collect();
        Ok(entries)
    }

    async fn file_exists(&self, path: &str) -> Result<bool, StorageError> {
        let key = normalize(path)?;
        let files = self.files.read().map_err(|_| poisoned())?;
        Ok(files.contains_key(&key))
    }

    async fn delete_file(&self, path: &str) -> Result<(), StorageError> {
        let key = normalize(path)?;
        let mut files = self.files.write().map_err(|_| poisoned())?;
        files
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| StorageError::FileNotFound(path.to_string()))
    }

    async fn create_dir(&self, path: &str) -> Result<(), StorageError> {
        let key = normalize(path)?;
        let mut dirs = self.dirs.write().map_err(|_| poisoned())?;
        dirs.insert(key);
        Ok(())
    }

    async fn dir_exists(&self, path: &str) -> Result<bool, StorageError> {
        let key = normalize(path)?;
        if key.is_empty() {
            return Ok(true);
        }
        if self.dirs.read().map_err(|_| poisoned())?.contains(&key) {
            return Ok(true);
        }
        let prefix = format!("{}/", key);
        let files = self.files.read().map_err(|_| poisoned())?;
        Ok(files.keys().any(|k| k.starts_with(&prefix)))
    }
}
