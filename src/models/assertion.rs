//! Assertion model

use super::entity::{EntityMeta, impl_entity};
use crate::urn::{EntityType, Urn};
use serde::{Deserialize, Serialize};

/// Kind of data quality assertion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssertionType {
    Freshness,
    Volume,
    Sql,
    Field,
    DataSchema,
    #[default]
    Custom,
}

impl AssertionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssertionType::Freshness => "FRESHNESS",
            AssertionType::Volume => "VOLUME",
            AssertionType::Sql => "SQL",
            AssertionType::Field => "FIELD",
            AssertionType::DataSchema => "DATA_SCHEMA",
            AssertionType::Custom => "CUSTOM",
        }
    }
}

/// An assertion on a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub name: String,
    #[serde(default)]
    pub assertion_type: AssertionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Entity the assertion checks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_urn: Option<Urn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
}

impl Assertion {
    pub fn new(name: impl Into<String>, assertion_type: AssertionType) -> Self {
        Self {
            meta: EntityMeta::local(),
            name: name.into(),
            assertion_type,
            description: None,
            entity_urn: None,
            external_url: None,
        }
    }
}

impl_entity!(Assertion, EntityType::Assertion);
