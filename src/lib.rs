//! DataHub Metadata Manager SDK
//!
//! Provides unified interfaces for:
//! - Local metadata entities and their sync bookkeeping
//! - Deterministic URNs
//! - MCP generation with content-aware (timestamp-insensitive) file writes
//! - Connection-aware selection and reconciliation against a DataHub instance
//! - Structured property and hierarchy validation
//! - Catalog persistence through storage backends
//! - Staging generated files onto a Git review branch

pub mod catalog;
pub mod config;
pub mod git;
pub mod mcp;
pub mod models;
pub mod response;
pub mod storage;
pub mod sync;
pub mod urn;
pub mod validation;

#[cfg(feature = "cli")]
pub mod cli;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogError, CatalogLoader, CatalogSaver, EntityTable};
pub use config::{AppConfig, ConfigError};
pub use git::{GitError, GitPublisher, PushOutcome, StagedFile, stage_entity};
#[cfg(feature = "git")]
pub use git::{GitCredentials, GitService};
pub use mcp::{BuildContext, EntityMcps, Mcp, McpBuilder, McpError, McpWriter, WriteReport};
pub use response::ApiResponse;
#[cfg(feature = "native-fs")]
pub use storage::filesystem::FileSystemStorageBackend;
pub use storage::memory::MemoryStorageBackend;
pub use storage::{StorageBackend, StorageError};
pub use sync::{
    InMemorySource, MetadataSource, SyncError, SyncReport, SyncService, filter_by_connection,
    filter_domains_by_connection, reconcile,
};
pub use urn::{EntityType, Urn, UrnError, deterministic_urn};
pub use validation::{ValidationError, validate_catalog, validate_structured_property};

// Re-export models
pub use models::{
    Assertion, Connection, ConnectionId, DataContract, DataProduct, Domain, Entity, EntityMeta,
    GlossaryNode, GlossaryTerm, StructuredProperty, SyncStatus, Tag,
};
