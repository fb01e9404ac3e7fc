//! Local metadata catalog
//!
//! Holds the locally managed rows of every entity type and persists them as
//! YAML through a [`StorageBackend`](crate::storage::StorageBackend).

pub mod store;
pub mod table;

pub use store::{CatalogLoader, CatalogSaver};
pub use table::EntityTable;

use crate::models::{
    Assertion, DataContract, DataProduct, Domain, GlossaryNode, GlossaryTerm, StructuredProperty,
    Tag,
};
use crate::storage::StorageError;
use serde::{Deserialize, Serialize};

/// Error type for catalog operations
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("URN {urn} already exists (connection: {})", connection.as_deref().unwrap_or("none"))]
    DuplicateUrn {
        urn: String,
        connection: Option<String>,
    },
    #[error("Row {index} does not exist (table has {len} rows)")]
    RowNotFound { index: usize, len: usize },
    #[error("Pulled entity '{0}' has no URN")]
    MissingUrn(String),
    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },
    #[error("Failed to serialize {path}: {message}")]
    Serialize { path: String, message: String },
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Every locally managed entity, one table per type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub tags: EntityTable<Tag>,
    #[serde(default)]
    pub domains: EntityTable<Domain>,
    #[serde(default)]
    pub glossary_nodes: EntityTable<GlossaryNode>,
    #[serde(default)]
    pub glossary_terms: EntityTable<GlossaryTerm>,
    #[serde(default)]
    pub structured_properties: EntityTable<StructuredProperty>,
    #[serde(default)]
    pub assertions: EntityTable<Assertion>,
    #[serde(default)]
    pub data_contracts: EntityTable<DataContract>,
    #[serde(default)]
    pub data_products: EntityTable<DataProduct>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of rows across all tables
    pub fn len(&self) -> usize {
        self.tags.len()
            + self.domains.len()
            + self.glossary_nodes.len()
            + self.glossary_terms.len()
            + self.structured_properties.len()
            + self.assertions.len()
            + self.data_contracts.len()
            + self.data_products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
