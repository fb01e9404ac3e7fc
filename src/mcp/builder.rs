//! MCP assembly for local entities
//!
//! Each entity produces its properties aspect first, followed by the common
//! aspects: `ownership` (only with owners), `institutionalMemory` (only with
//! links) and `status`. Entities without a URN are addressed by their
//! deterministic URN for the build context's environment.

use super::aspects::*;
use super::{Mcp, McpError};
use crate::catalog::Catalog;
use crate::models::{
    Assertion, ConnectionId, DataContract, DataProduct, Domain, Entity, GlossaryNode,
    GlossaryTerm, OwnershipType, PropertyValue, StructuredProperty, Tag, ValueType,
};
use crate::sync::domains::resolve_parent_urn;
use crate::sync::filter_indices_by_connection;
use crate::urn::{EntityType, Urn};
use crate::validation::validate_structured_property;
use chrono::Utc;
use tracing::debug;

/// Environment and audit information shared by one build
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub environment: String,
    pub mutation: Option<String>,
    pub actor: Urn,
    /// Timestamp used for every audit stamp of the build
    pub now_millis: i64,
    /// Connection whose rows win when one DataHub entity has several copies
    pub connection: Option<ConnectionId>,
}

impl BuildContext {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            mutation: None,
            actor: Urn::corpuser("datahub"),
            now_millis: Utc::now().timestamp_millis(),
            connection: None,
        }
    }

    pub fn with_connection(mut self, connection: Option<ConnectionId>) -> Self {
        self.connection = connection;
        self
    }

    pub fn with_mutation(mut self, mutation: impl Into<String>) -> Self {
        let mutation = mutation.into();
        self.mutation = (!mutation.trim().is_empty()).then_some(mutation);
        self
    }

    pub fn with_actor(mut self, actor: Urn) -> Self {
        self.actor = actor;
        self
    }

    /// Pin the clock, mostly for reproducible output
    pub fn at(mut self, now_millis: i64) -> Self {
        self.now_millis = now_millis;
        self
    }

    pub fn stamp(&self) -> AuditStamp {
        AuditStamp {
            time: self.now_millis,
            actor: self.actor.to_string(),
        }
    }

    /// URN an entity is written under
    pub fn urn_for<E: Entity>(&self, entity: &E) -> Urn {
        entity.resolved_urn(&self.environment, self.mutation.as_deref())
    }
}

/// All MCPs generated for one entity
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMcps {
    pub entity_type: EntityType,
    pub urn: Urn,
    /// Output directory name, unique per URN
    pub file_stem: String,
    pub mcps: Vec<Mcp>,
}

impl EntityMcps {
    pub fn aspect_names(&self) -> Vec<&str> {
        self.mcps.iter().map(|m| m.aspect_name.as_str()).collect()
    }
}

/// Replace characters that are unsafe in file names. Names made only of
/// dots (or nothing) get a leading `_` so they stay a normal path segment.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '(' | ')' | ',' => '_',
            c if c.is_whitespace() => '_',
            _ => c,
        })
        .collect();
    if cleaned.chars().all(|c| c == '.') {
        format!("_{}", cleaned)
    } else {
        cleaned
    }
}

/// Output directory for an entity: its URN id, made file-system safe.
pub fn entity_file_stem(urn: &Urn) -> String {
    sanitize_filename(urn.id())
}

/// Rows that generate MCPs: one per DataHub id, preferring `current`.
fn scoped<E: Entity + Clone>(rows: &[E], current: Option<&ConnectionId>) -> Vec<E> {
    filter_indices_by_connection(rows, current)
        .into_iter()
        .map(|idx| rows[idx].clone())
        .collect()
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn owner_type(ownership_type: &OwnershipType) -> (String, Option<String>) {
    let system = |name: &str, key: &str| {
        (
            name.to_string(),
            Some(format!("urn:li:ownershipType:__system__{}", key)),
        )
    };
    match ownership_type {
        OwnershipType::TechnicalOwner => system("TECHNICAL_OWNER", "technical_owner"),
        OwnershipType::BusinessOwner => system("BUSINESS_OWNER", "business_owner"),
        OwnershipType::DataSteward => system("DATA_STEWARD", "data_steward"),
        OwnershipType::None => system("NONE", "none"),
        OwnershipType::Custom(urn) => ("CUSTOM".to_string(), Some(urn.to_string())),
    }
}

/// Builds MCPs for local entities
#[derive(Debug, Clone)]
pub struct McpBuilder {
    ctx: BuildContext,
}

impl McpBuilder {
    pub fn new(ctx: BuildContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }

    fn finish<E: Entity>(
        &self,
        entity: &E,
        urn: Urn,
        mut mcps: Vec<Mcp>,
    ) -> Result<EntityMcps, McpError> {
        let meta = entity.meta();
        let entity_type = E::ENTITY_TYPE;

        if let Some(ownership) = meta.ownership.as_ref().filter(|o| !o.is_empty()) {
            let owners = ownership
                .owners
                .iter()
                .map(|o| {
                    let (ownership_type, type_urn) = owner_type(&o.ownership_type);
                    OwnerEntry {
                        owner: o.owner.to_string(),
                        ownership_type,
                        type_urn,
                    }
                })
                .collect();
            mcps.push(Mcp::upsert(
                &urn,
                entity_type,
                &OwnershipAspect {
                    owners,
                    last_modified: self.ctx.stamp(),
                },
            )?);
        }

        if !meta.links.is_empty() {
            let elements = meta
                .links
                .iter()
                .map(|link| MemoryElement {
                    url: link.url.clone(),
                    description: link.description.clone(),
                    create_stamp: self.ctx.stamp(),
                })
                .collect();
            mcps.push(Mcp::upsert(
                &urn,
                entity_type,
                &InstitutionalMemoryAspect { elements },
            )?);
        }

        mcps.push(Mcp::upsert(
            &urn,
            entity_type,
            &StatusAspect { removed: false },
        )?);

        debug!("Built {} MCPs for {}", mcps.len(), urn);
        Ok(EntityMcps {
            entity_type,
            file_stem: entity_file_stem(&urn),
            urn,
            mcps,
        })
    }

    pub fn tag(&self, tag: &Tag) -> Result<EntityMcps, McpError> {
        let urn = self.ctx.urn_for(tag);
        let properties = TagPropertiesAspect {
            name: tag.name.trim().to_string(),
            description: non_empty(&tag.description),
            color_hex: non_empty(&tag.color_hex).map(|c| c.to_ascii_uppercase()),
        };
        let mcps = vec![Mcp::upsert(&urn, EntityType::Tag, &properties)?];
        self.finish(tag, urn, mcps)
    }

    pub fn domain(&self, domain: &Domain, parent: Option<&Urn>) -> Result<EntityMcps, McpError> {
        let urn = self.ctx.urn_for(domain);
        let properties = DomainPropertiesAspect {
            name: domain.name.trim().to_string(),
            description: non_empty(&domain.description),
            parent_domain: parent.map(Urn::to_string),
            created: self.ctx.stamp(),
        };
        let mcps = vec![Mcp::upsert(&urn, EntityType::Domain, &properties)?];
        self.finish(domain, urn, mcps)
    }

    pub fn glossary_node(
        &self,
        node: &GlossaryNode,
        parent: Option<&Urn>,
    ) -> Result<EntityMcps, McpError> {
        let urn = self.ctx.urn_for(node);
        let info = GlossaryNodeInfoAspect {
            name: node.name.trim().to_string(),
            definition: non_empty(&node.description).unwrap_or_default(),
            parent_node: parent.map(Urn::to_string),
        };
        let mcps = vec![Mcp::upsert(&urn, EntityType::GlossaryNode, &info)?];
        self.finish(node, urn, mcps)
    }

    pub fn glossary_term(
        &self,
        term: &GlossaryTerm,
        parent: Option<&Urn>,
    ) -> Result<EntityMcps, McpError> {
        let urn = self.ctx.urn_for(term);
        let info = GlossaryTermInfoAspect {
            name: term.name.trim().to_string(),
            definition: non_empty(&term.description).unwrap_or_default(),
            term_source: term.term_source.as_str().to_string(),
            source_ref: non_empty(&term.source_ref),
            source_url: non_empty(&term.source_url),
            parent_node: parent.map(Urn::to_string),
        };
        let mut mcps = vec![Mcp::upsert(&urn, EntityType::GlossaryTerm, &info)?];
        if !term.related_terms.is_empty() {
            let related = GlossaryRelatedTermsAspect {
                related_terms: term.related_terms.iter().map(Urn::to_string).collect(),
            };
            mcps.push(Mcp::upsert(&urn, EntityType::GlossaryTerm, &related)?);
        }
        self.finish(term, urn, mcps)
    }

    /// Rejects definitions that fail validation (e.g. duplicate allowed values)
    pub fn structured_property(
        &self,
        property: &StructuredProperty,
    ) -> Result<EntityMcps, McpError> {
        validate_structured_property(property).map_err(|e| McpError::InvalidEntity {
            entity: property.qualified_name.clone(),
            message: e.to_string(),
        })?;

        let urn = self.ctx.urn_for(property);
        let allowed_values = property
            .allowed_values
            .iter()
            .map(|allowed| {
                let value = match &allowed.value {
                    PropertyValue::Number(n) => PrimitiveValue::Double(*n),
                    PropertyValue::Text(s) => match (property.value_type, s.trim().parse::<f64>()) {
                        (ValueType::Number, Ok(n)) => PrimitiveValue::Double(n),
                        _ => PrimitiveValue::String(s.trim().to_string()),
                    },
                };
                AllowedValueEntry {
                    value,
                    description: non_empty(&allowed.description),
                }
            })
            .collect();
        let definition = PropertyDefinitionAspect {
            qualified_name: property.qualified_name.trim().to_string(),
            display_name: non_empty(&property.display_name),
            value_type: property.value_type.datahub_urn().to_string(),
            description: non_empty(&property.description),
            cardinality: property.cardinality.as_str().to_string(),
            entity_types: property.entity_type_urns(),
            allowed_values,
            immutable: property.immutable,
            last_modified: self.ctx.stamp(),
        };
        let mcps = vec![Mcp::upsert(
            &urn,
            EntityType::StructuredProperty,
            &definition,
        )?];
        self.finish(property, urn, mcps)
    }

    pub fn assertion(&self, assertion: &Assertion) -> Result<EntityMcps, McpError> {
        let urn = self.ctx.urn_for(assertion);
        let assertion_type = assertion.assertion_type.as_str().to_string();
        let info = AssertionInfoAspect {
            custom_assertion: assertion.entity_urn.as_ref().map(|entity| CustomAssertionInfo {
                assertion_type: assertion_type.clone(),
                entity: entity.to_string(),
            }),
            assertion_type,
            description: non_empty(&assertion.description),
            external_url: non_empty(&assertion.external_url),
            source: AssertionSource {
                source_type: "NATIVE".to_string(),
                created: self.ctx.stamp(),
            },
        };
        let mcps = vec![Mcp::upsert(&urn, EntityType::Assertion, &info)?];
        self.finish(assertion, urn, mcps)
    }

    pub fn data_contract(&self, contract: &DataContract) -> Result<EntityMcps, McpError> {
        let urn = self.ctx.urn_for(contract);
        let refs = |urns: &[Urn]| {
            urns.iter()
                .map(|u| ContractAssertionRef {
                    assertion: u.to_string(),
                })
                .collect::<Vec<_>>()
        };
        let properties = DataContractPropertiesAspect {
            entity: contract.entity_urn.to_string(),
            schema: refs(&contract.schema_assertions),
            freshness: refs(&contract.freshness_assertions),
            data_quality: refs(&contract.data_quality_assertions),
        };
        let status = DataContractStatusAspect {
            state: contract.state.as_str().to_string(),
        };
        let mcps = vec![
            Mcp::upsert(&urn, EntityType::DataContract, &properties)?,
            Mcp::upsert(&urn, EntityType::DataContract, &status)?,
        ];
        self.finish(contract, urn, mcps)
    }

    pub fn data_product(&self, product: &DataProduct) -> Result<EntityMcps, McpError> {
        let urn = self.ctx.urn_for(product);
        let properties = DataProductPropertiesAspect {
            name: product.name.trim().to_string(),
            description: non_empty(&product.description),
            external_url: non_empty(&product.external_url),
            assets: product
                .assets
                .iter()
                .map(|asset| ProductAsset {
                    destination_urn: asset.to_string(),
                    created: self.ctx.stamp(),
                })
                .collect(),
        };
        let mut mcps = vec![Mcp::upsert(&urn, EntityType::DataProduct, &properties)?];
        if let Some(domain) = &product.domain {
            let domains = DomainsAspect {
                domains: vec![domain.to_string()],
            };
            mcps.push(Mcp::upsert(&urn, EntityType::DataProduct, &domains)?);
        }
        self.finish(product, urn, mcps)
    }

    /// Build MCPs for every entity in the catalog, resolving hierarchy parents.
    ///
    /// Rows are first narrowed to one per DataHub id for the context's
    /// connection, the same selection `filter` and `sync` see.
    pub fn catalog(&self, catalog: &Catalog) -> Result<Vec<EntityMcps>, McpError> {
        let env = self.ctx.environment.as_str();
        let mutation = self.ctx.mutation.as_deref();
        let current = self.ctx.connection.as_ref();
        let mut out = Vec::new();

        for tag in scoped(catalog.tags.rows(), current) {
            out.push(self.tag(&tag)?);
        }
        let domains = scoped(catalog.domains.rows(), current);
        for domain in &domains {
            let parent = domain
                .parent
                .as_deref()
                .filter(|p| !p.trim().is_empty())
                .map(|reference| resolve_parent_urn(reference, &domains, env, mutation));
            out.push(self.domain(domain, parent.as_ref())?);
        }
        let nodes = scoped(catalog.glossary_nodes.rows(), current);
        for node in &nodes {
            let parent = node
                .parent
                .as_deref()
                .filter(|p| !p.trim().is_empty())
                .map(|reference| resolve_parent_urn(reference, &nodes, env, mutation));
            out.push(self.glossary_node(node, parent.as_ref())?);
        }
        for term in scoped(catalog.glossary_terms.rows(), current) {
            let parent = term
                .parent
                .as_deref()
                .filter(|p| !p.trim().is_empty())
                .map(|reference| resolve_parent_urn(reference, &nodes, env, mutation));
            out.push(self.glossary_term(&term, parent.as_ref())?);
        }
        for property in scoped(catalog.structured_properties.rows(), current) {
            out.push(self.structured_property(&property)?);
        }
        for assertion in scoped(catalog.assertions.rows(), current) {
            out.push(self.assertion(&assertion)?);
        }
        for contract in scoped(catalog.data_contracts.rows(), current) {
            out.push(self.data_contract(&contract)?);
        }
        for product in scoped(catalog.data_products.rows(), current) {
            out.push(self.data_product(&product)?);
        }
        Ok(out)
    }
}
