//! Domain model

use super::entity::{EntityMeta, impl_entity};
use crate::urn::EntityType;
use serde::{Deserialize, Serialize};

/// A DataHub domain
///
/// `parent` references the parent domain by datahub_id, URN or name; see
/// [`crate::sync::domains::resolve_parent_urn`] for how it is resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl Domain {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: EntityMeta::local(),
            name: name.into(),
            description: None,
            parent: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

impl_entity!(Domain, EntityType::Domain);
