//! Data contract model

use super::entity::{EntityMeta, impl_entity};
use crate::urn::{EntityType, Urn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractState {
    #[default]
    Active,
    Pending,
}

impl ContractState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractState::Active => "ACTIVE",
            ContractState::Pending => "PENDING",
        }
    }
}

/// A data contract binding assertions to a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataContract {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub name: String,
    /// Dataset the contract covers
    pub entity_urn: Urn,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schema_assertions: Vec<Urn>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub freshness_assertions: Vec<Urn>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_quality_assertions: Vec<Urn>,
    #[serde(default)]
    pub state: ContractState,
}

impl DataContract {
    pub fn new(name: impl Into<String>, entity_urn: Urn) -> Self {
        Self {
            meta: EntityMeta::local(),
            name: name.into(),
            entity_urn,
            schema_assertions: Vec::new(),
            freshness_assertions: Vec::new(),
            data_quality_assertions: Vec::new(),
            state: ContractState::Active,
        }
    }
}

impl_entity!(DataContract, EntityType::DataContract);
