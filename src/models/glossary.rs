//! Glossary nodes and terms

use super::entity::{EntityMeta, impl_entity};
use crate::urn::{EntityType, Urn};
use serde::{Deserialize, Serialize};

/// A glossary node (a folder of terms)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlossaryNode {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parent node by datahub_id, URN or name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl GlossaryNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: EntityMeta::local(),
            name: name.into(),
            description: None,
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

impl_entity!(GlossaryNode, EntityType::GlossaryNode);

/// Where a glossary term's definition comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TermSource {
    #[default]
    Internal,
    External,
}

impl TermSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TermSource::Internal => "INTERNAL",
            TermSource::External => "EXTERNAL",
        }
    }
}

/// A glossary term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlossaryTerm {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub term_source: TermSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Parent node by datahub_id, URN or name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_terms: Vec<Urn>,
}

impl GlossaryTerm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: EntityMeta::local(),
            name: name.into(),
            description: None,
            term_source: TermSource::Internal,
            source_ref: None,
            source_url: None,
            parent: None,
            related_terms: Vec::new(),
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

impl_entity!(GlossaryTerm, EntityType::GlossaryTerm);
