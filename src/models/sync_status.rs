//! Sync status bookkeeping

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a local row matches, was never pushed to, or diverged from DataHub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    #[default]
    NotSynced,
    Synced,
    LocalOnly,
    RemoteOnly,
    Modified,
    PendingPush,
}

impl SyncStatus {
    /// Status after a user edits the local row.
    ///
    /// Rows that mirrored DataHub become `Modified`; rows that never reached
    /// DataHub (or are already queued) keep their status.
    pub fn after_local_edit(self) -> Self {
        match self {
            SyncStatus::Synced | SyncStatus::RemoteOnly => SyncStatus::Modified,
            other => other,
        }
    }

    /// Status after the row's MCP files were staged for review
    pub fn after_staged(self) -> Self {
        SyncStatus::PendingPush
    }

    /// Status after the row was pushed to DataHub
    pub fn after_push(self) -> Self {
        SyncStatus::Synced
    }

    /// Status after the row was pulled from DataHub
    pub fn after_pull(self) -> Self {
        SyncStatus::Synced
    }

    /// Whether the row has changes that DataHub has not seen yet
    pub fn has_unpushed_changes(self) -> bool {
        matches!(
            self,
            SyncStatus::LocalOnly | SyncStatus::Modified | SyncStatus::PendingPush
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::NotSynced => "NOT_SYNCED",
            SyncStatus::Synced => "SYNCED",
            SyncStatus::LocalOnly => "LOCAL_ONLY",
            SyncStatus::RemoteOnly => "REMOTE_ONLY",
            SyncStatus::Modified => "MODIFIED",
            SyncStatus::PendingPush => "PENDING_PUSH",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
