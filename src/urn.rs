//! DataHub URNs
//!
//! A URN has the shape `urn:li:<entityType>:<id>`. Locally created entities
//! receive a deterministic URN derived from their type, identity key, target
//! environment and an optional mutation name, so regenerating MCPs for the
//! same entity always addresses the same remote object.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

const URN_PREFIX: &str = "urn:li:";

/// Namespace for deterministic URNs (UUID v5).
const URN_NAMESPACE: Uuid = Uuid::from_u128(0x6d2f_1c3a_9b7e_4f10_a5c4_2e8d_0b91_7c35);

/// Error type for URN parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrnError {
    #[error("URN must start with 'urn:li:': {0}")]
    MissingPrefix(String),
    #[error("URN has no entity type: {0}")]
    MissingEntityType(String),
    #[error("URN has an empty id: {0}")]
    EmptyId(String),
    #[error("Unknown entity type: {0}")]
    UnknownEntityType(String),
}

/// DataHub entity types handled by the manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityType {
    Tag,
    Domain,
    GlossaryNode,
    GlossaryTerm,
    StructuredProperty,
    Assertion,
    DataContract,
    DataProduct,
    Corpuser,
    CorpGroup,
    Dataset,
}

impl EntityType {
    /// Name used inside URNs and in the `entityType` field of MCPs
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Tag => "tag",
            EntityType::Domain => "domain",
            EntityType::GlossaryNode => "glossaryNode",
            EntityType::GlossaryTerm => "glossaryTerm",
            EntityType::StructuredProperty => "structuredProperty",
            EntityType::Assertion => "assertion",
            EntityType::DataContract => "dataContract",
            EntityType::DataProduct => "dataProduct",
            EntityType::Corpuser => "corpuser",
            EntityType::CorpGroup => "corpGroup",
            EntityType::Dataset => "dataset",
        }
    }

    /// Entity types the manager owns locally (excludes users, groups, datasets)
    pub fn managed() -> &'static [EntityType] {
        &[
            EntityType::Tag,
            EntityType::Domain,
            EntityType::GlossaryNode,
            EntityType::GlossaryTerm,
            EntityType::StructuredProperty,
            EntityType::Assertion,
            EntityType::DataContract,
            EntityType::DataProduct,
        ]
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = UrnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let found = match s {
            "tag" => EntityType::Tag,
            "domain" => EntityType::Domain,
            "glossaryNode" => EntityType::GlossaryNode,
            "glossaryTerm" => EntityType::GlossaryTerm,
            "structuredProperty" => EntityType::StructuredProperty,
            "assertion" => EntityType::Assertion,
            "dataContract" => EntityType::DataContract,
            "dataProduct" => EntityType::DataProduct,
            "corpuser" => EntityType::Corpuser,
            "corpGroup" => EntityType::CorpGroup,
            "dataset" => EntityType::Dataset,
            other => return Err(UrnError::UnknownEntityType(other.to_string())),
        };
        Ok(found)
    }
}

/// A validated DataHub URN
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Urn(String);

impl Urn {
    /// Parse and validate a URN string
    pub fn parse(value: &str) -> Result<Self, UrnError> {
        let value = value.trim();
        let rest = value
            .strip_prefix(URN_PREFIX)
            .ok_or_else(|| UrnError::MissingPrefix(value.to_string()))?;
        let (entity_type, id) = rest
            .split_once(':')
            .ok_or_else(|| UrnError::MissingEntityType(value.to_string()))?;
        if entity_type.is_empty() {
            return Err(UrnError::MissingEntityType(value.to_string()));
        }
        if id.is_empty() {
            return Err(UrnError::EmptyId(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    /// Build a URN from an entity type and an id
    pub fn new(entity_type: EntityType, id: &str) -> Self {
        Self(format!("{}{}:{}", URN_PREFIX, entity_type.as_str(), id))
    }

    /// URN of a DataHub user
    pub fn corpuser(username: &str) -> Self {
        Self::new(EntityType::Corpuser, username)
    }

    /// Raw entity type segment
    pub fn entity_type_str(&self) -> &str {
        let rest = &self.0[URN_PREFIX.len()..];
        rest.split_once(':').map(|(t, _)| t).unwrap_or(rest)
    }

    /// Entity type, if it is one the manager knows
    pub fn entity_type(&self) -> Option<EntityType> {
        self.entity_type_str().parse().ok()
    }

    /// Everything after the entity type segment
    pub fn id(&self) -> &str {
        let rest = &self.0[URN_PREFIX.len()..];
        rest.split_once(':').map(|(_, id)| id).unwrap_or("")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Urn {
    type Err = UrnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Urn::parse(s)
    }
}

impl TryFrom<String> for Urn {
    type Error = UrnError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Urn::parse(&value)
    }
}

impl From<Urn> for String {
    fn from(urn: Urn) -> Self {
        urn.0
    }
}

impl AsRef<str> for Urn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Compute the deterministic URN for an entity.
///
/// The key is `"{type}:{environment}:{id}"`, with `":{mutation}"` appended
/// when a mutation name is given. Whitespace around the inputs is ignored.
pub fn deterministic_urn(
    entity_type: EntityType,
    id: &str,
    environment: &str,
    mutation: Option<&str>,
) -> Urn {
    let mut key = format!(
        "{}:{}:{}",
        entity_type.as_str(),
        environment.trim(),
        id.trim()
    );
    if let Some(mutation) = mutation.map(str::trim).filter(|m| !m.is_empty()) {
        key.push(':');
        key.push_str(mutation);
    }
    let uuid = Uuid::new_v5(&URN_NAMESPACE, key.as_bytes());
    Urn::new(entity_type, &uuid.simple().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let urn = Urn::parse("urn:li:tag:pii").unwrap();
        assert_eq!(urn.entity_type(), Some(EntityType::Tag));
        assert_eq!(urn.id(), "pii");
    }

    #[test]
    fn test_parse_nested_id() {
        let urn = Urn::parse("urn:li:dataset:(urn:li:dataPlatform:hive,db.t,PROD)").unwrap();
        assert_eq!(urn.entity_type(), Some(EntityType::Dataset));
        assert_eq!(urn.id(), "(urn:li:dataPlatform:hive,db.t,PROD)");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(Urn::parse("tag:pii"), Err(UrnError::MissingPrefix(_))));
        assert!(matches!(Urn::parse("urn:li:tag"), Err(UrnError::MissingEntityType(_))));
        assert!(matches!(Urn::parse("urn:li:tag:"), Err(UrnError::EmptyId(_))));
    }

    #[test]
    fn test_unknown_entity_type_still_parses() {
        let urn = Urn::parse("urn:li:chart:(looker,1)").unwrap();
        assert_eq!(urn.entity_type(), None);
        assert_eq!(urn.entity_type_str(), "chart");
    }

    #[test]
    fn test_deterministic_urn_is_stable() {
        let a = deterministic_urn(EntityType::Domain, "finance", "PROD", None);
        let b = deterministic_urn(EntityType::Domain, " finance ", "PROD", None);
        assert_eq!(a, b);
        assert_eq!(a.entity_type(), Some(EntityType::Domain));
        assert_eq!(a.id().len(), 32);
    }

    #[test]
    fn test_deterministic_urn_inputs_matter() {
        let base = deterministic_urn(EntityType::Domain, "finance", "PROD", None);
        assert_ne!(base, deterministic_urn(EntityType::Tag, "finance", "PROD", None));
        assert_ne!(base, deterministic_urn(EntityType::Domain, "sales", "PROD", None));
        assert_ne!(base, deterministic_urn(EntityType::Domain, "finance", "DEV", None));
        assert_ne!(
            base,
            deterministic_urn(EntityType::Domain, "finance", "PROD", Some("eu"))
        );
        // An empty mutation is the same as none
        assert_eq!(
            base,
            deterministic_urn(EntityType::Domain, "finance", "PROD", Some(" "))
        );
    }

    #[test]
    fn test_serde_as_string() {
        let urn = Urn::new(EntityType::Tag, "pii");
        let json = serde_json::to_string(&urn).unwrap();
        assert_eq!(json, "\"urn:li:tag:pii\"");
        let bad: Result<Urn, _> = serde_json::from_str("\"nope\"");
        assert!(bad.is_err());
    }
}
