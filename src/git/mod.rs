//! Staging generated MCP files onto a Git branch
//!
//! The manager never commits to `main`/`master`: staged files land on a
//! review branch from which a pull request is opened outside this crate.
//! [`GitPublisher`] is the seam; [`GitService`] (feature `git`) is the
//! git2-backed implementation.

#[cfg(feature = "git")]
mod git_service;

#[cfg(feature = "git")]
pub use git_service::{GitCredentials, GitService};

use crate::catalog::{CatalogError, EntityTable};
use crate::mcp::{EntityMcps, McpError};
use crate::models::Entity;
use crate::storage::join_path;
use serde::Serialize;
use tracing::{info, warn};

/// Branches staged files must never be committed to
pub const PROTECTED_BRANCHES: &[&str] = &["main", "master"];

pub fn is_protected_branch(branch: &str) -> bool {
    PROTECTED_BRANCHES.contains(&branch.trim())
}

/// Error type for Git operations
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("Git repository error: {0}")]
    Repository(String),
    #[error("Git operation failed: {0}")]
    Operation(String),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Refusing to commit to protected branch '{0}'")]
    ProtectedBranch(String),
}

/// A file to be committed, with a path relative to the repository root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedFile {
    pub path: String,
    pub content: String,
}

impl StagedFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// All MCPs of one entity as a JSON array at `<dir>/<entityType>/<file_stem>.json`
    pub fn from_entity_mcps(dir: &str, entity: &EntityMcps) -> Result<Self, McpError> {
        let mut content =
            serde_json::to_string_pretty(&entity.mcps).map_err(|e| McpError::Serialization {
                aspect: entity.urn.to_string(),
                message: e.to_string(),
            })?;
        content.push('\n');
        let path = join_path(
            dir,
            &format!("{}/{}.json", entity.entity_type, entity.file_stem),
        );
        Ok(Self { path, content })
    }
}

/// Result of a push, shaped like the `{success, error?}` reply of the
/// staging endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PushOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// Commits a staged file onto the review branch
pub trait GitPublisher {
    fn push_to_git(&self, file: &StagedFile, commit_message: &str) -> PushOutcome;
}

impl<P: GitPublisher + ?Sized> GitPublisher for &P {
    fn push_to_git(&self, file: &StagedFile, commit_message: &str) -> PushOutcome {
        (**self).push_to_git(file, commit_message)
    }
}

/// Push one row's file and mark the row `PENDING_PUSH` when that succeeds.
///
/// A failed push leaves the row untouched and is reported through the
/// returned outcome, not as an error.
pub fn stage_entity<E, P>(
    publisher: &P,
    table: &mut EntityTable<E>,
    index: usize,
    file: &StagedFile,
    commit_message: &str,
) -> Result<PushOutcome, CatalogError>
where
    E: Entity + Clone,
    P: GitPublisher + ?Sized,
{
    let name = table
        .get(index)
        .map(|row| row.name().to_string())
        .ok_or(CatalogError::RowNotFound {
            index,
            len: table.len(),
        })?;

    let outcome = publisher.push_to_git(file, commit_message);
    if outcome.success {
        table.mark_staged(index)?;
        info!("Staged '{}' as {}", name, file.path);
    } else {
        warn!(
            "Staging '{}' failed: {}",
            name,
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(outcome)
}
