//! Data product model

use super::entity::{EntityMeta, impl_entity};
use crate::urn::{EntityType, Urn};
use serde::{Deserialize, Serialize};

/// A data product grouping assets under a domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataProduct {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Urn>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assets: Vec<Urn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
}

impl DataProduct {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: EntityMeta::local(),
            name: name.into(),
            description: None,
            domain: None,
            assets: Vec::new(),
            external_url: None,
        }
    }
}

impl_entity!(DataProduct, EntityType::DataProduct);
