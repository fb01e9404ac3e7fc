//! Metadata Change Proposals
//!
//! An MCP is DataHub's unit of change: one aspect written to one entity.
//! This module builds MCPs from local entities ([`builder`]), defines the
//! aspect payloads ([`aspects`]) and writes them to storage without touching
//! files whose content is unchanged ([`writer`]).

pub mod aspects;
pub mod builder;
pub mod writer;

use crate::storage::StorageError;
use crate::urn::{EntityType, Urn};
use serde::{Deserialize, Serialize};

pub use aspects::{Aspect, AuditStamp};
pub use builder::{BuildContext, EntityMcps, McpBuilder};
pub use writer::{
    McpWriter, TIMESTAMP_FIELDS, WriteOutcome, WriteReport, canonical_json, content_hash,
    remove_timestamp_fields,
};

/// Error type for MCP generation and writing
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    #[error("Failed to serialize aspect {aspect}: {message}")]
    Serialization { aspect: String, message: String },
    #[error("Invalid entity {entity}: {message}")]
    InvalidEntity { entity: String, message: String },
    #[error("{path} would be written for both {first} and {second}")]
    PathCollision {
        path: String,
        first: String,
        second: String,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// How DataHub applies the proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    #[default]
    Upsert,
    Delete,
}

/// A single Metadata Change Proposal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mcp {
    pub entity_urn: Urn,
    pub entity_type: EntityType,
    pub aspect_name: String,
    pub aspect: serde_json::Value,
    pub change_type: ChangeType,
}

impl Mcp {
    /// Build an UPSERT proposal for a typed aspect
    pub fn upsert<A: Aspect>(
        entity_urn: &Urn,
        entity_type: EntityType,
        aspect: &A,
    ) -> Result<Self, McpError> {
        let value = serde_json::to_value(aspect).map_err(|e| McpError::Serialization {
            aspect: A::NAME.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            entity_urn: entity_urn.clone(),
            entity_type,
            aspect_name: A::NAME.to_string(),
            aspect: value,
            change_type: ChangeType::Upsert,
        })
    }

    /// JSON form as written to disk
    pub fn to_value(&self) -> Result<serde_json::Value, McpError> {
        serde_json::to_value(self).map_err(|e| McpError::Serialization {
            aspect: self.aspect_name.clone(),
            message: e.to_string(),
        })
    }
}
