//! Error type for CLI commands

use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::mcp::McpError;
use crate::storage::StorageError;
use crate::sync::SyncError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to read {0}: {1}")]
    FileReadError(PathBuf, String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Mcp(#[from] McpError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Git error: {0}")]
    Git(String),
}
