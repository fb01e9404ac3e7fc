//! Synchronization with DataHub
//!
//! Local rows are first narrowed to one row per `datahub_id` by connection
//! priority ([`filter`]), remote entities are fetched page by page through a
//! [`MetadataSource`] and parsed into typed records ([`remote`]), and both
//! sides are reconciled into synced / modified / local-only / remote-only
//! buckets ([`reconcile`]). Reconciliation only proposes status changes;
//! applying them is a separate, explicit step.

pub mod domains;
pub mod filter;
pub mod reconcile;
pub mod remote;
pub mod service;
pub mod source;

pub use domains::{resolve_domain_parent, resolve_parent_urn};
pub use filter::{filter_by_connection, filter_domains_by_connection, filter_indices_by_connection};
pub use reconcile::{
    FieldDiff, FieldMap, LocalOnlyEntry, LocalView, MatchKind, MatchedPair, StatusUpdate,
    SyncRecord, SyncReport, SyncSummary, apply_status_updates, reconcile,
};
pub use remote::{
    RemoteAssertion, RemoteDomain, RemoteGlossaryNode, RemoteGlossaryTerm, RemoteRecord,
    RemoteStructuredProperty, RemoteTag,
};
pub use service::{DEFAULT_PAGE_SIZE, SyncService, pull_remote_only};
pub use source::{InMemorySource, MetadataSource, SearchPage, fetch_all};

/// Error type for sync operations
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("DataHub request failed: {0}")]
    Remote(String),
    #[error("Invalid DataHub response: {0}")]
    InvalidResponse(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
