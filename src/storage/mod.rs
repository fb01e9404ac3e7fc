//! Where MCP files and catalog tables are kept.
//!
//! [`StorageBackend`] hides the medium. [`filesystem::FileSystemStorageBackend`]
//! serves the CLI; [`memory::MemoryStorageBackend`] backs tests and dry runs.

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("no such file: {0}")]
    FileNotFound(String),
    #[error("no such directory: {0}")]
    DirectoryNotFound(String),
    #[error("storage I/O failed: {0}")]
    IoError(String),
    #[error("access refused: {0}")]
    PermissionDenied(String),
}

/// Byte-level access to a tree of `/`-separated paths relative to the
/// backend root.
#[async_trait(?Send)]
pub trait StorageBackend: Send + Sync {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Missing parent directories are created.
    async fn write_file(&self, path: &str, content: &[u8]) -> Result<(), StorageError>;

    /// Bare names of the files directly in `dir`
    async fn list_files(&self, dir: &str) -> Result<Vec<String>, StorageError>;

    async fn file_exists(&self, path: &str) -> Result<bool, StorageError>;

    async fn delete_file(&self, path: &str) -> Result<(), StorageError>;

    /// Recursive; succeeds when the directory is already there.
    async fn create_dir(&self, path: &str) -> Result<(), StorageError>;

    async fn dir_exists(&self, path: &str) -> Result<bool, StorageError>;
}

#[async_trait(?Send)]
impl<B: StorageBackend + ?Sized> StorageBackend for &B {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        (**self).read_file(path).await
    }

    async fn write_file(&self, path: &str, content: &[u8]) -> Result<(), StorageError> {
        (**self).write_file(path, content).await
    }

    async fn list_files(&self, dir: &str) -> Result<Vec<String>, StorageError> {
        (**self).list_files(dir).await
    }

    async fn file_exists(&self, path: &str) -> Result<bool, StorageError> {
        (**self).file_exists(path).await
    }

    async fn delete_file(&self, path: &str) -> Result<(), StorageError> {
        (**self).delete_file(path).await
    }

    async fn create_dir(&self, path: &str) -> Result<(), StorageError> {
        (**self).create_dir(path).await
    }

    async fn dir_exists(&self, path: &str) -> Result<bool, StorageError> {
        (**self).dir_exists(path).await
    }
}

/// Join two storage path segments with a single `/`.
pub fn join_path(base: &str, rest: &str) -> String {
    let base = base.trim_end_matches('/');
    let rest = rest.trim_start_matches('/');
    if base.is_empty() {
        rest.to_string()
    } else {
        format!("{}/{}", base, rest)
    }
}

#[cfg(feature = "native-fs")]
pub mod filesystem;

pub mod memory;

#[cfg(test)]
mod tests {
    use super::join_path;

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("out", "tag/pii.json"), "out/tag/pii.json");
        assert_eq!(join_path("out/", "/tag"), "out/tag");
        assert_eq!(join_path("", "tag"), "tag");
    }
}
