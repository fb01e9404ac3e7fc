//! Typed aspect payloads
//!
//! Field names follow DataHub's PDL schemas (camelCase on the wire).

use serde::Serialize;

/// An aspect payload with its DataHub aspect name
pub trait Aspect: Serialize {
    const NAME: &'static str;
}

macro_rules! aspect {
    ($ty:ty, $name:literal) => {
        impl Aspect for $ty {
            const NAME: &'static str = $name;
        }
    };
}

/// Who changed something and when (epoch millis)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditStamp {
    pub time: i64,
    pub actor: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusAspect {
    pub removed: bool,
}
aspect!(StatusAspect, "status");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerEntry {
    pub owner: String,
    #[serde(rename = "type")]
    pub ownership_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_urn: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipAspect {
    pub owners: Vec<OwnerEntry>,
    pub last_modified: AuditStamp,
}
aspect!(OwnershipAspect, "ownership");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryElement {
    pub url: String,
    pub description: String,
    pub create_stamp: AuditStamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstitutionalMemoryAspect {
    pub elements: Vec<MemoryElement>,
}
aspect!(InstitutionalMemoryAspect, "institutionalMemory");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagAssociation {
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlobalTagsAspect {
    pub tags: Vec<TagAssociation>,
}
aspect!(GlobalTagsAspect, "globalTags");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermAssociation {
    pub urn: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlossaryTermsAspect {
    pub terms: Vec<TermAssociation>,
    pub audit_stamp: AuditStamp,
}
aspect!(GlossaryTermsAspect, "glossaryTerms");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainsAspect {
    pub domains: Vec<String>,
}
aspect!(DomainsAspect, "domains");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagPropertiesAspect {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
}
aspect!(TagPropertiesAspect, "tagProperties");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainPropertiesAspect {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_domain: Option<String>,
    pub created: AuditStamp,
}
aspect!(DomainPropertiesAspect, "domainProperties");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlossaryNodeInfoAspect {
    pub name: String,
    pub definition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_node: Option<String>,
}
aspect!(GlossaryNodeInfoAspect, "glossaryNodeInfo");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlossaryTermInfoAspect {
    pub name: String,
    pub definition: String,
    pub term_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_node: Option<String>,
}
aspect!(GlossaryTermInfoAspect, "glossaryTermInfo");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlossaryRelatedTermsAspect {
    pub related_terms: Vec<String>,
}
aspect!(GlossaryRelatedTermsAspect, "glossaryRelatedTerms");

/// Allowed value as DataHub's `PropertyValue` union
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PrimitiveValue {
    #[serde(rename = "string")]
    String(String),
    #[serde(rename = "double")]
    Double(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllowedValueEntry {
    pub value: PrimitiveValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDefinitionAspect {
    pub qualified_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub value_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub cardinality: String,
    pub entity_types: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<AllowedValueEntry>,
    pub immutable: bool,
    pub last_modified: AuditStamp,
}
aspect!(PropertyDefinitionAspect, "propertyDefinition");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssertionSource {
    #[serde(rename = "type")]
    pub source_type: String,
    pub created: AuditStamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomAssertionInfo {
    #[serde(rename = "type")]
    pub assertion_type: String,
    pub entity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionInfoAspect {
    #[serde(rename = "type")]
    pub assertion_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    pub source: AssertionSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_assertion: Option<CustomAssertionInfo>,
}
aspect!(AssertionInfoAspect, "assertionInfo");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractAssertionRef {
    pub assertion: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataContractPropertiesAspect {
    pub entity: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub schema: Vec<ContractAssertionRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub freshness: Vec<ContractAssertionRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data_quality: Vec<ContractAssertionRef>,
}
aspect!(DataContractPropertiesAspect, "dataContractProperties");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataContractStatusAspect {
    pub state: String,
}
aspect!(DataContractStatusAspect, "dataContractStatus");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAsset {
    pub destination_urn: String,
    pub created: AuditStamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProductPropertiesAspect {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assets: Vec<ProductAsset>,
}
aspect!(DataProductPropertiesAspect, "dataProductProperties");
