//! Typed views of DataHub GraphQL entities
//!
//! Only the fields the manager compares or imports are modelled; everything
//! else in the payload is ignored. Optional GraphQL objects are `Option`s so a
//! partially populated entity still parses.

use super::reconcile::{FieldMap, SyncRecord, join_sorted, normalize_color, normalize_text};
use crate::models::{
    AllowedValue, Assertion, AssertionType, Cardinality, ConnectionId, Domain, Entity, EntityMeta,
    GlossaryNode, GlossaryTerm, Owner, Ownership, OwnershipType, PropertyValue,
    StructuredProperty, Tag, TermSource, ValueType,
};
use crate::urn::{EntityType, Urn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A remote entity type the manager can reconcile against
pub trait RemoteRecord: DeserializeOwned + SyncRecord {
    const ENTITY_TYPE: EntityType;

    /// Local row type this remote entity is pulled into
    type Local: Entity;

    fn urn(&self) -> &Urn;

    /// Local row mirroring this entity, bound to `connection`
    fn local_row(&self, connection: Option<&ConnectionId>) -> Self::Local;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrnRef {
    pub urn: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteOwner {
    pub owner: UrnRef,
    /// Legacy ownership type enum, e.g. `TECHNICAL_OWNER`
    #[serde(default, rename = "type")]
    pub legacy_type: Option<String>,
    #[serde(default)]
    pub ownership_type: Option<UrnRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RemoteOwnership {
    #[serde(default)]
    pub owners: Vec<RemoteOwner>,
}

impl RemoteOwnership {
    /// Convert to the local ownership model, skipping owners with bad URNs
    pub fn to_local(&self) -> Ownership {
        let owners = self
            .owners
            .iter()
            .filter_map(|o| {
                let owner = Urn::parse(&o.owner.urn).ok()?;
                let ownership_type = match o.legacy_type.as_deref() {
                    Some("BUSINESS_OWNER") => OwnershipType::BusinessOwner,
                    Some("DATA_STEWARD") => OwnershipType::DataSteward,
                    Some("NONE") => OwnershipType::None,
                    Some("TECHNICAL_OWNER") => OwnershipType::TechnicalOwner,
                    _ => o
                        .ownership_type
                        .as_ref()
                        .and_then(|t| Urn::parse(&t.urn).ok())
                        .map(OwnershipType::Custom)
                        .unwrap_or_default(),
                };
                Some(Owner::new(owner, ownership_type))
            })
            .collect();
        Ownership { owners }
    }
}

fn pulled_meta(
    urn: &Urn,
    connection: Option<&ConnectionId>,
    ownership: Option<&RemoteOwnership>,
) -> EntityMeta {
    let mut meta = EntityMeta::pulled(urn.clone(), connection.cloned());
    meta.ownership = ownership.map(RemoteOwnership::to_local).filter(|o| !o.is_empty());
    meta
}

fn fallback_name<'a>(name: Option<&'a String>, urn: &'a Urn) -> &'a str {
    name.map(String::as_str)
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| urn.id())
}

// ---------------------------------------------------------------------------
// Tags

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagProperties {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color_hex: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTag {
    pub urn: Urn,
    #[serde(default)]
    pub properties: Option<TagProperties>,
    #[serde(default)]
    pub ownership: Option<RemoteOwnership>,
}

impl RemoteTag {
    /// Local row for this remote tag
    pub fn to_local(&self, connection: Option<&ConnectionId>) -> Tag {
        let props = self.properties.clone().unwrap_or_default();
        Tag {
            meta: pulled_meta(&self.urn, connection, self.ownership.as_ref()),
            name: self.sync_name().to_string(),
            description: props.description,
            color_hex: props.color_hex,
        }
    }
}

impl SyncRecord for RemoteTag {
    fn sync_urn(&self) -> Option<&str> {
        Some(self.urn.as_str())
    }

    fn sync_datahub_id(&self) -> Option<&str> {
        Some(self.urn.id())
    }

    fn sync_name(&self) -> &str {
        fallback_name(self.properties.as_ref().and_then(|p| p.name.as_ref()), &self.urn)
    }

    fn comparable_fields(&self) -> FieldMap {
        let props = self.properties.clone().unwrap_or_default();
        FieldMap::from([
            ("name", normalize_text(Some(self.sync_name()))),
            ("description", normalize_text(props.description.as_deref())),
            ("color", normalize_color(props.color_hex.as_deref())),
        ])
    }
}

impl RemoteRecord for RemoteTag {
    const ENTITY_TYPE: EntityType = EntityType::Tag;

    type Local = Tag;

    fn urn(&self) -> &Urn {
        &self.urn
    }

    fn local_row(&self, connection: Option<&ConnectionId>) -> Tag {
        self.to_local(connection)
    }
}

// ---------------------------------------------------------------------------
// Domains

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NamedProperties {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParentDomains {
    #[serde(default)]
    pub domains: Vec<UrnRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDomain {
    pub urn: Urn,
    #[serde(default)]
    pub properties: Option<NamedProperties>,
    /// Ancestors, nearest first
    #[serde(default)]
    pub parent_domains: Option<ParentDomains>,
    #[serde(default)]
    pub ownership: Option<RemoteOwnership>,
}

impl RemoteDomain {
    pub fn parent_urn(&self) -> Option<&str> {
        self.parent_domains
            .as_ref()
            .and_then(|p| p.domains.first())
            .map(|d| d.urn.as_str())
    }

    pub fn to_local(&self, connection: Option<&ConnectionId>) -> Domain {
        Domain {
            meta: pulled_meta(&self.urn, connection, self.ownership.as_ref()),
            name: self.sync_name().to_string(),
            description: self.properties.as_ref().and_then(|p| p.description.clone()),
            parent: self.parent_urn().map(str::to_string),
        }
    }
}

impl SyncRecord for RemoteDomain {
    fn sync_urn(&self) -> Option<&str> {
        Some(self.urn.as_str())
    }

    fn sync_datahub_id(&self) -> Option<&str> {
        Some(self.urn.id())
    }

    fn sync_name(&self) -> &str {
        fallback_name(self.properties.as_ref().and_then(|p| p.name.as_ref()), &self.urn)
    }

    fn comparable_fields(&self) -> FieldMap {
        FieldMap::from([
            ("name", normalize_text(Some(self.sync_name()))),
            (
                "description",
                normalize_text(self.properties.as_ref().and_then(|p| p.description.as_deref())),
            ),
            ("parent", normalize_text(self.parent_urn())),
        ])
    }
}

impl RemoteRecord for RemoteDomain {
    const ENTITY_TYPE: EntityType = EntityType::Domain;

    type Local = Domain;

    fn urn(&self) -> &Urn {
        &self.urn
    }

    fn local_row(&self, connection: Option<&ConnectionId>) -> Domain {
        self.to_local(connection)
    }
}

// ---------------------------------------------------------------------------
// Glossary

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlossaryProperties {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub definition: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub term_source: Option<String>,
}

impl GlossaryProperties {
    /// DataHub exposes the text as `definition` or `description` depending on version
    fn text(&self) -> Option<&str> {
        self.definition
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .or(self.description.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParentNodes {
    #[serde(default)]
    pub nodes: Vec<UrnRef>,
}

fn first_parent(parents: &Option<ParentNodes>) -> Option<&str> {
    parents
        .as_ref()
        .and_then(|p| p.nodes.first())
        .map(|n| n.urn.as_str())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteGlossaryNode {
    pub urn: Urn,
    #[serde(default)]
    pub properties: Option<GlossaryProperties>,
    #[serde(default)]
    pub parent_nodes: Option<ParentNodes>,
    #[serde(default)]
    pub ownership: Option<RemoteOwnership>,
}

impl RemoteGlossaryNode {
    pub fn parent_urn(&self) -> Option<&str> {
        first_parent(&self.parent_nodes)
    }

    pub fn to_local(&self, connection: Option<&ConnectionId>) -> GlossaryNode {
        GlossaryNode {
            meta: pulled_meta(&self.urn, connection, self.ownership.as_ref()),
            name: self.sync_name().to_string(),
            description: self
                .properties
                .as_ref()
                .and_then(|p| p.text())
                .map(str::to_string),
            parent: self.parent_urn().map(str::to_string),
        }
    }
}

impl SyncRecord for RemoteGlossaryNode {
    fn sync_urn(&self) -> Option<&str> {
        Some(self.urn.as_str())
    }

    fn sync_datahub_id(&self) -> Option<&str> {
        Some(self.urn.id())
    }

    fn sync_name(&self) -> &str {
        fallback_name(self.properties.as_ref().and_then(|p| p.name.as_ref()), &self.urn)
    }

    fn comparable_fields(&self) -> FieldMap {
        FieldMap::from([
            ("name", normalize_text(Some(self.sync_name()))),
            (
                "description",
                normalize_text(self.properties.as_ref().and_then(|p| p.text())),
            ),
            ("parent", normalize_text(self.parent_urn())),
        ])
    }
}

impl RemoteRecord for RemoteGlossaryNode {
    const ENTITY_TYPE: EntityType = EntityType::GlossaryNode;

    type Local = GlossaryNode;

    fn urn(&self) -> &Urn {
        &self.urn
    }

    fn local_row(&self, connection: Option<&ConnectionId>) -> GlossaryNode {
        self.to_local(connection)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteGlossaryTerm {
    pub urn: Urn,
    #[serde(default)]
    pub properties: Option<GlossaryProperties>,
    #[serde(default)]
    pub parent_nodes: Option<ParentNodes>,
    #[serde(default)]
    pub ownership: Option<RemoteOwnership>,
}

impl RemoteGlossaryTerm {
    pub fn parent_urn(&self) -> Option<&str> {
        first_parent(&self.parent_nodes)
    }

    pub fn to_local(&self, connection: Option<&ConnectionId>) -> GlossaryTerm {
        let props = self.properties.clone().unwrap_or_default();
        let mut term = GlossaryTerm::new(self.sync_name());
        term.meta = pulled_meta(&self.urn, connection, self.ownership.as_ref());
        term.description = props.text().map(str::to_string);
        term.term_source = match props.term_source.as_deref() {
            Some("EXTERNAL") => TermSource::External,
            _ => TermSource::Internal,
        };
        term.parent = self.parent_urn().map(str::to_string);
        term
    }
}

impl SyncRecord for RemoteGlossaryTerm {
    fn sync_urn(&self) -> Option<&str> {
        Some(self.urn.as_str())
    }

    fn sync_datahub_id(&self) -> Option<&str> {
        Some(self.urn.id())
    }

    fn sync_name(&self) -> &str {
        fallback_name(self.properties.as_ref().and_then(|p| p.name.as_ref()), &self.urn)
    }

    fn comparable_fields(&self) -> FieldMap {
        FieldMap::from([
            ("name", normalize_text(Some(self.sync_name()))),
            (
                "description",
                normalize_text(self.properties.as_ref().and_then(|p| p.text())),
            ),
            ("parent", normalize_text(self.parent_urn())),
        ])
    }
}

impl RemoteRecord for RemoteGlossaryTerm {
    const ENTITY_TYPE: EntityType = EntityType::GlossaryTerm;

    type Local = GlossaryTerm;

    fn urn(&self) -> &Urn {
        &self.urn
    }

    fn local_row(&self, connection: Option<&ConnectionId>) -> GlossaryTerm {
        self.to_local(connection)
    }
}

// ---------------------------------------------------------------------------
// Structured properties

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePropertyValue {
    #[serde(default)]
    pub string_value: Option<String>,
    #[serde(default)]
    pub number_value: Option<f64>,
}

impl RemotePropertyValue {
    fn to_local(&self) -> Option<PropertyValue> {
        match (&self.string_value, self.number_value) {
            (Some(s), _) => Some(PropertyValue::Text(s.clone())),
            (None, Some(n)) => Some(PropertyValue::Number(n)),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteAllowedValue {
    pub value: RemotePropertyValue,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePropertyDefinition {
    #[serde(default)]
    pub qualified_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub value_type: Option<UrnRef>,
    #[serde(default)]
    pub cardinality: Option<String>,
    #[serde(default)]
    pub allowed_values: Vec<RemoteAllowedValue>,
    #[serde(default)]
    pub entity_types: Vec<UrnRef>,
    #[serde(default)]
    pub immutable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteStructuredProperty {
    pub urn: Urn,
    #[serde(default)]
    pub definition: Option<RemotePropertyDefinition>,
}

impl RemoteStructuredProperty {
    fn qualified_name(&self) -> &str {
        fallback_name(
            self.definition.as_ref().and_then(|d| d.qualified_name.as_ref()),
            &self.urn,
        )
    }

    fn value_type(&self) -> Option<ValueType> {
        self.definition
            .as_ref()
            .and_then(|d| d.value_type.as_ref())
            .and_then(|t| ValueType::from_datahub(&t.urn))
    }

    pub fn to_local(&self, connection: Option<&ConnectionId>) -> StructuredProperty {
        let def = self.definition.clone().unwrap_or_default();
        let mut property =
            StructuredProperty::new(self.qualified_name(), self.value_type().unwrap_or_default());
        property.meta = pulled_meta(&self.urn, connection, None);
        property.display_name = def.display_name;
        property.description = def.description;
        property.cardinality = match def.cardinality.as_deref() {
            Some("MULTIPLE") => Cardinality::Multiple,
            _ => Cardinality::Single,
        };
        property.allowed_values = def
            .allowed_values
            .iter()
            .filter_map(|v| {
                Some(AllowedValue {
                    value: v.value.to_local()?,
                    description: v.description.clone(),
                })
            })
            .collect();
        property.entity_types = def
            .entity_types
            .iter()
            .map(|t| {
                t.urn
                    .strip_prefix("urn:li:entityType:datahub.")
                    .unwrap_or(&t.urn)
                    .to_string()
            })
            .collect();
        property.immutable = def.immutable;
        property
    }
}

impl SyncRecord for RemoteStructuredProperty {
    fn sync_urn(&self) -> Option<&str> {
        Some(self.urn.as_str())
    }

    fn sync_datahub_id(&self) -> Option<&str> {
        Some(self.urn.id())
    }

    fn sync_name(&self) -> &str {
        self.qualified_name()
    }

    fn comparable_fields(&self) -> FieldMap {
        let def = self.definition.clone().unwrap_or_default();
        let allowed = def
            .allowed_values
            .iter()
            .filter_map(|v| v.value.to_local())
            .map(|v| v.normalized());
        let entity_types = def.entity_types.iter().map(|t| {
            t.urn
                .strip_prefix("urn:li:entityType:datahub.")
                .unwrap_or(&t.urn)
                .to_string()
        });
        FieldMap::from([
            ("display_name", normalize_text(def.display_name.as_deref())),
            ("description", normalize_text(def.description.as_deref())),
            ("value_type", self.value_type().map(|t| t.to_string())),
            (
                "cardinality",
                Some(def.cardinality.unwrap_or_else(|| "SINGLE".to_string())),
            ),
            ("allowed_values", join_sorted(allowed)),
            ("entity_types", join_sorted(entity_types)),
            ("immutable", Some(def.immutable.to_string())),
        ])
    }
}

impl RemoteRecord for RemoteStructuredProperty {
    const ENTITY_TYPE: EntityType = EntityType::StructuredProperty;

    type Local = StructuredProperty;

    fn urn(&self) -> &Urn {
        &self.urn
    }

    fn local_row(&self, connection: Option<&ConnectionId>) -> StructuredProperty {
        self.to_local(connection)
    }
}

// ---------------------------------------------------------------------------
// Assertions

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAssertionInfo {
    #[serde(default, rename = "type")]
    pub assertion_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub external_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAssertion {
    pub urn: Urn,
    #[serde(default)]
    pub info: Option<RemoteAssertionInfo>,
}

impl RemoteAssertion {
    fn assertion_type(&self) -> AssertionType {
        let raw = self.info.as_ref().and_then(|i| i.assertion_type.as_deref());
        match raw {
            Some("FRESHNESS") => AssertionType::Freshness,
            Some("VOLUME") => AssertionType::Volume,
            Some("SQL") => AssertionType::Sql,
            Some("FIELD") => AssertionType::Field,
            Some("DATA_SCHEMA") => AssertionType::DataSchema,
            _ => AssertionType::Custom,
        }
    }

    pub fn to_local(&self, connection: Option<&ConnectionId>) -> Assertion {
        let info = self.info.clone().unwrap_or_default();
        Assertion {
            meta: pulled_meta(&self.urn, connection, None),
            name: self.sync_name().to_string(),
            assertion_type: self.assertion_type(),
            description: info.description,
            entity_urn: None,
            external_url: info.external_url,
        }
    }
}

impl SyncRecord for RemoteAssertion {
    fn sync_urn(&self) -> Option<&str> {
        Some(self.urn.as_str())
    }

    fn sync_datahub_id(&self) -> Option<&str> {
        Some(self.urn.id())
    }

    fn sync_name(&self) -> &str {
        fallback_name(self.info.as_ref().and_then(|i| i.description.as_ref()), &self.urn)
    }

    fn comparable_fields(&self) -> FieldMap {
        let info = self.info.clone().unwrap_or_default();
        FieldMap::from([
            ("type", Some(self.assertion_type().as_str().to_string())),
            ("description", normalize_text(info.description.as_deref())),
            ("external_url", normalize_text(info.external_url.as_deref())),
        ])
    }
}

impl RemoteRecord for RemoteAssertion {
    const ENTITY_TYPE: EntityType = EntityType::Assertion;

    type Local = Assertion;

    fn urn(&self) -> &Urn {
        &self.urn
    }

    fn local_row(&self, connection: Option<&ConnectionId>) -> Assertion {
        self.to_local(connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_remote_tag_parses_graphql_shape() {
        let tag: RemoteTag = serde_json::from_value(json!({
            "urn": "urn:li:tag:pii",
            "type": "TAG",
            "properties": {"name": "PII", "description": " personal ", "colorHex": "#ff0000"},
            "ownership": {"owners": [
                {"owner": {"urn": "urn:li:corpuser:jdoe"}, "type": "DATA_STEWARD"}
            ]}
        }))
        .unwrap();
        let fields = tag.comparable_fields();
        assert_eq!(fields["description"], Some("personal".to_string()));
        assert_eq!(fields["color"], Some("#FF0000".to_string()));

        let local = tag.to_local(None);
        assert_eq!(local.name, "PII");
        assert_eq!(local.meta.datahub_id.as_deref(), Some("pii"));
        let owners = local.meta.ownership.unwrap().owners;
        assert_eq!(owners[0].ownership_type, OwnershipType::DataSteward);
    }

    #[test]
    fn test_remote_name_falls_back_to_urn_id() {
        let tag: RemoteTag = serde_json::from_value(json!({"urn": "urn:li:tag:legacy"})).unwrap();
        assert_eq!(tag.sync_name(), "legacy");
    }

    #[test]
    fn test_remote_domain_parent() {
        let domain: RemoteDomain = serde_json::from_value(json!({
            "urn": "urn:li:domain:child",
            "properties": {"name": "Child"},
            "parentDomains": {"domains": [{"urn": "urn:li:domain:parent"}, {"urn": "urn:li:domain:root"}]}
        }))
        .unwrap();
        assert_eq!(domain.parent_urn(), Some("urn:li:domain:parent"));
        assert_eq!(domain.to_local(None).parent.as_deref(), Some("urn:li:domain:parent"));
    }

    #[test]
    fn test_remote_property_definition() {
        let prop: RemoteStructuredProperty = serde_json::from_value(json!({
            "urn": "urn:li:structuredProperty:io.acryl.tier",
            "definition": {
                "qualifiedName": "io.acryl.tier",
                "valueType": {"urn": "urn:li:dataType:datahub.string"},
                "cardinality": "MULTIPLE",
                "allowedValues": [{"value": {"stringValue": "gold"}}, {"value": {"stringValue": "bronze"}}],
                "entityTypes": [{"urn": "urn:li:entityType:datahub.dataset"}]
            }
        }))
        .unwrap();
        let local = prop.to_local(None);
        assert_eq!(local.cardinality, Cardinality::Multiple);
        assert_eq!(local.entity_types, vec!["dataset".to_string()]);
        assert_eq!(
            prop.comparable_fields()["allowed_values"],
            Some("bronze,gold".to_string())
        );
    }
}
