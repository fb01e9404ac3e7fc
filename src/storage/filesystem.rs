//! Native directory backend.
//!
//! Serves the MCP output directory and the on-disk catalog. Every storage
//! path is interpreted below a fixed root; `..` segments are refused and
//! paths that already exist are checked against the canonical root so a
//! symlink cannot lead a write outside of it.

use super::{StorageBackend, StorageError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, trace};

/// Storage rooted at a directory on the local disk.
pub struct FileSystemStorageBackend {
    base_path: PathBuf,
}

/// What a missing target should turn into.
#[derive(Clone, Copy)]
enum Missing {
    File,
    Dir,
    Io,
}

fn io_failure(action: &str, path: &str, err: std::io::Error, missing: Missing) -> StorageError {
    match (err.kind(), missing) {
        (ErrorKind::NotFound, Missing::File) => StorageError::FileNotFound(path.to_string()),
        (ErrorKind::NotFound, Missing::Dir) => StorageError::DirectoryNotFound(path.to_string()),
        _ => StorageError::IoError(format!("cannot {} '{}': {}", action, path, err)),
    }
}

impl FileSystemStorageBackend {
    /// Root the backend at `base_path`, e.g. the configured `output.mcp_dir`.
    ///
    /// The directory does not have to exist yet; the first write creates it.
    ///
    /// ```rust
    /// use datahub_metadata_sdk::storage::filesystem::FileSystemStorageBackend;
    ///
    /// let backend = FileSystemStorageBackend::new("/srv/metadata/mcps");
    /// assert!(backend.base_path().ends_with("mcps"));
    /// ```
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn canonical_root(&self) -> PathBuf {
        self.base_path
            .canonicalize()
            .unwrap_or_else(|_| self.base_path.clone())
    }

    /// Fails when `existing` resolves to somewhere outside the root.
    fn ensure_contained(&self, existing: &Path) -> Result<PathBuf, StorageError> {
        let resolved = existing
            .canonicalize()
            .map_err(|e| StorageError::IoError(format!("cannot resolve {:?}: {}", existing, e)))?;
        if resolved.starts_with(self.canonical_root()) {
            Ok(resolved)
        } else {
            Err(StorageError::PermissionDenied(format!(
                "{:?} is outside the storage root",
                existing
            )))
        }
    }

    /// Map a `/`-separated storage path onto the disk.
    fn resolve_path(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path.trim_start_matches('/'));
        let mut full = self.base_path.clone();
        for component in relative.components() {
            match component {
                Component::Normal(segment) => full.push(segment),
                Component::CurDir => {}
                _ => {
                    return Err(StorageError::PermissionDenied(format!(
                        "'{}' must stay below the storage root",
                        path
                    )));
                }
            }
        }
        if full == self.base_path {
            return Ok(full);
        }

        if full.exists() {
            return self.ensure_contained(&full);
        }
        // Not created yet: the nearest existing parent still has to be ours.
        if let Some(parent) = full.parent().filter(|p| p.exists()) {
            self.ensure_contained(parent)?;
        }
        trace!(?full, "resolved new storage path");
        Ok(full)
    }

    async fn stat_kind(&self, path: &str, want_dir: bool) -> Result<bool, StorageError> {
        let target = self.resolve_path(path)?;
        match fs::metadata(&target).await {
            Ok(meta) => Ok(if want_dir { meta.is_dir() } else { meta.is_file() }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_failure("inspect", path, e, Missing::Io)),
        }
    }
}

#[async_trait(?Send)]
impl StorageBackend for FileSystemStorageBackend {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let target = self.resolve_path(path)?;
        fs::read(&target)
            .await
            .map_err(|e| io_failure("read", path, e, Missing::File))
    }

    async fn write_file(&self, path: &str, content: &[u8]) -> Result<(), StorageError> {
        let target = self.resolve_path(path)?;
        if let Some(dir) = target.parent() {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| io_failure("create parent of", path, e, Missing::Io))?;
        }
        fs::write(&target, content)
            .await
            .map_err(|e| io_failure("write", path, e, Missing::Io))?;
        debug!(path, bytes = content.len(), "file written");
        Ok(())
    }

    /// Plain files directly inside `dir`; subdirectories are skipped.
    async fn list_files(&self, dir: &str) -> Result<Vec<String>, StorageError> {
        let target = self.resolve_path(dir)?;
        let mut entries = fs::read_dir(&target)
            .await
            .map_err(|e| io_failure("list", dir, e, Missing::Dir))?;

        let mut names = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => return Err(io_failure("list", dir, e, Missing::Io)),
            };
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if let (true, Some(name)) = (is_file, entry.file_name().to_str()) {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    async fn file_exists(&self, path: &str) -> Result<bool, StorageError> {
        self.stat_kind(path, false).await
    }

    async fn delete_file(&self, path: &str) -> Result<(), StorageError> {
        let target = self.resolve_path(path)?;
        fs::remove_file(&target)
            .await
            .map_err(|e| io_failure("delete", path, e, Missing::File))
    }

    async fn create_dir(&self, path: &str) -> Result<(), StorageError> {
        let target = self.resolve_path(path)?;
        fs::create_dir_all(&target)
            .await
            .map_err(|e| io_failure("create", path, e, Missing::Io))
    }

    async fn dir_exists(&self, path: &str) -> Result<bool, StorageError> {
        self.stat_kind(path, true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parent_segments_are_refused() {
        let temp = TempDir::new().unwrap();
        let backend = FileSystemStorageBackend::new(temp.path());

        for bad in ["../catalog/tags.yaml", "/tag/../../escape.json", "tag/.."] {
            assert!(
                matches!(backend.resolve_path(bad), Err(StorageError::PermissionDenied(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_mcp_layout_paths_resolve_below_root() {
        let temp = TempDir::new().unwrap();
        let backend = FileSystemStorageBackend::new(temp.path());

        let term = backend
            .resolve_path("glossaryTerm/revenue/glossaryTermInfo.json")
            .unwrap();
        assert!(term.starts_with(temp.path()));
        assert_eq!(
            backend.resolve_path("/mcps.json").unwrap(),
            temp.path().join("mcps.json")
        );
        assert_eq!(backend.resolve_path("./").unwrap(), temp.path());
    }

    #[test]
    fn test_empty_path_is_the_root_even_before_it_exists() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("not-yet-created");
        let backend = FileSystemStorageBackend::new(&root);
        assert_eq!(backend.resolve_path("").unwrap(), root);
    }

    #[tokio::test]
    async fn test_write_read_and_missing_file() {
        let temp = TempDir::new().unwrap();
        let backend = FileSystemStorageBackend::new(temp.path().join("mcps"));

        backend.write_file("tag/pii.json", b"[]").await.unwrap();
        assert_eq!(backend.read_file("tag/pii.json").await.unwrap(), b"[]");
        assert!(backend.file_exists("tag/pii.json").await.unwrap());
        assert!(backend.dir_exists("tag").await.unwrap());
        assert!(!backend.file_exists("tag").await.unwrap());

        assert!(matches!(
            backend.read_file("tag/gone.json").await,
            Err(StorageError::FileNotFound(_))
        ));
        backend.delete_file("tag/pii.json").await.unwrap();
        assert!(!backend.file_exists("tag/pii.json").await.unwrap());
    }

    #[tokio::test]
    async fn test_listing_returns_only_direct_files() {
        let temp = TempDir::new().unwrap();
        let backend = FileSystemStorageBackend::new(temp.path());

        backend.write_file("domain/finance.json", b"{}").await.unwrap();
        backend.write_file("domain/child/payments.json", b"{}").await.unwrap();

        let files = backend.list_files("domain").await.unwrap();
        assert_eq!(files, vec!["finance.json".to_string()]);
        assert!(matches!(
            backend.list_files("glossaryNode").await,
            Err(StorageError::DirectoryNotFound(_))
        ));
    }
}
