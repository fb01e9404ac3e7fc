//! Validation functionality
//!
//! Provides validation logic for:
//! - Structured property definitions (qualified names, value types, allowed values)
//! - Tag colors and entity names
//! - Domain and glossary hierarchies (unknown parents, cycles)

pub mod hierarchy;

pub use hierarchy::{validate_domain_hierarchy, validate_glossary_hierarchy};

use crate::catalog::Catalog;
use crate::models::{Entity, PropertyValue, StructuredProperty, Tag, ValueType};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static QUALIFIED_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("valid regex"));
static COLOR_HEX_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid regex"));

/// Error type for validation failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{entity_type} name must not be empty")]
    EmptyName { entity_type: &'static str },
    #[error("Invalid qualified name '{0}': only letters, digits, '_', '.' and '-' are allowed")]
    InvalidQualifiedName(String),
    #[error("Unknown value type: {0}")]
    UnknownValueType(String),
    #[error("Structured property '{0}' must apply to at least one entity type")]
    MissingEntityTypes(String),
    #[error("Allowed value '{value}' of '{property}' is not a number")]
    NonNumericAllowedValue { property: String, value: String },
    #[error("Duplicate allowed value '{value}' in '{property}'")]
    DuplicateAllowedValue { property: String, value: String },
    #[error("Invalid color '{color}' for tag '{tag}': expected #RRGGBB")]
    InvalidColor { tag: String, color: String },
    #[error("{entity_type} '{name}' references unknown parent '{parent}'")]
    UnknownParent {
        entity_type: &'static str,
        name: String,
        parent: String,
    },
    #[error("{entity_type} hierarchy contains a cycle: {}", path.join(" -> "))]
    HierarchyCycle {
        entity_type: &'static str,
        path: Vec<String>,
    },
}

/// Parse a value type as entered by a user (`string`, `NUMBER`, full DataHub URN, ...)
pub fn parse_value_type(value: &str) -> Result<ValueType, ValidationError> {
    ValueType::from_datahub(value.trim())
        .ok_or_else(|| ValidationError::UnknownValueType(value.to_string()))
}

/// Names must contain something other than whitespace
pub fn validate_name<E: Entity>(entity: &E) -> Result<(), ValidationError> {
    if entity.name().trim().is_empty() {
        return Err(ValidationError::EmptyName {
            entity_type: E::ENTITY_TYPE.as_str(),
        });
    }
    Ok(())
}

/// Validate a structured property definition before it is created or staged.
///
/// Duplicate allowed values are rejected for every value type except `urn`.
pub fn validate_structured_property(property: &StructuredProperty) -> Result<(), ValidationError> {
    let qualified_name = property.qualified_name.trim();
    if qualified_name.is_empty() {
        return Err(ValidationError::EmptyName {
            entity_type: StructuredProperty::ENTITY_TYPE.as_str(),
        });
    }
    if !QUALIFIED_NAME_REGEX.is_match(qualified_name) {
        return Err(ValidationError::InvalidQualifiedName(qualified_name.to_string()));
    }
    if property.entity_types.iter().all(|t| t.trim().is_empty()) {
        return Err(ValidationError::MissingEntityTypes(qualified_name.to_string()));
    }

    if property.value_type == ValueType::Number {
        for allowed in &property.allowed_values {
            if allowed.value.as_number().is_none() {
                return Err(ValidationError::NonNumericAllowedValue {
                    property: qualified_name.to_string(),
                    value: allowed.value.normalized(),
                });
            }
        }
    }

    if property.value_type != ValueType::Urn {
        let mut seen = HashSet::new();
        for allowed in &property.allowed_values {
            let key = match (&allowed.value, property.value_type) {
                (PropertyValue::Text(_), ValueType::Number) | (PropertyValue::Number(_), _) => {
                    allowed.value.as_number().map(|n| n.to_string())
                }
                (PropertyValue::Text(text), _) => Some(text.trim().to_string()),
            }
            .unwrap_or_else(|| allowed.value.normalized());
            if !seen.insert(key) {
                return Err(ValidationError::DuplicateAllowedValue {
                    property: qualified_name.to_string(),
                    value: allowed.value.normalized(),
                });
            }
        }
    }

    Ok(())
}

/// Non-empty name and, when set, a `#RRGGBB` color
pub fn validate_tag(tag: &Tag) -> Result<(), ValidationError> {
    validate_name(tag)?;
    if let Some(color) = tag.color_hex.as_deref().map(str::trim).filter(|c| !c.is_empty())
        && !COLOR_HEX_REGEX.is_match(color)
    {
        return Err(ValidationError::InvalidColor {
            tag: tag.name.clone(),
            color: color.to_string(),
        });
    }
    Ok(())
}

/// Every problem found in a catalog, in entity type order
pub fn validate_catalog(catalog: &Catalog) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(catalog.tags.rows().iter().filter_map(|t| validate_tag(t).err()));
    errors.extend(
        catalog
            .structured_properties
            .rows()
            .iter()
            .filter_map(|p| validate_structured_property(p).err()),
    );
    errors.extend(catalog.domains.rows().iter().filter_map(|d| validate_name(d).err()));
    errors.extend(
        catalog
            .glossary_nodes
            .rows()
            .iter()
            .filter_map(|n| validate_name(n).err()),
    );
    errors.extend(
        catalog
            .glossary_terms
            .rows()
            .iter()
            .filter_map(|t| validate_name(t).err()),
    );
    errors.extend(catalog.assertions.rows().iter().filter_map(|a| validate_name(a).err()));
    errors.extend(
        catalog
            .data_contracts
            .rows()
            .iter()
            .filter_map(|c| validate_name(c).err()),
    );
    errors.extend(
        catalog
            .data_products
            .rows()
            .iter()
            .filter_map(|p| validate_name(p).err()),
    );

    errors.extend(validate_domain_hierarchy(catalog.domains.rows()));
    errors.extend(validate_glossary_hierarchy(
        catalog.glossary_nodes.rows(),
        catalog.glossary_terms.rows(),
    ));
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AllowedValue;

    #[test]
    fn test_rejects_duplicate_allowed_values() {
        let values: Vec<AllowedValue> =
            serde_json::from_str(r#"[{"value": "A"}, {"value": "A"}]"#).unwrap();
        let prop =
            StructuredProperty::new("io.acryl.tier", ValueType::String).with_allowed_values(values);
        assert!(matches!(
            validate_structured_property(&prop),
            Err(ValidationError::DuplicateAllowedValue { .. })
        ));
    }

    #[test]
    fn test_duplicate_values_allowed_for_urn_type() {
        let prop = StructuredProperty::new("io.acryl.owner", ValueType::Urn).with_allowed_values(
            vec![
                AllowedValue::text("urn:li:corpuser:a"),
                AllowedValue::text("urn:li:corpuser:a"),
            ],
        );
        assert!(validate_structured_property(&prop).is_ok());
    }

    #[test]
    fn test_numeric_duplicates_compare_by_value() {
        let values: Vec<AllowedValue> =
            serde_json::from_str(r#"[{"value": 1}, {"value": "1.0"}]"#).unwrap();
        let prop =
            StructuredProperty::new("io.acryl.level", ValueType::Number).with_allowed_values(values);
        assert!(matches!(
            validate_structured_property(&prop),
            Err(ValidationError::DuplicateAllowedValue { .. })
        ));
    }

    #[test]
    fn test_number_values_must_be_numeric() {
        let prop = StructuredProperty::new("io.acryl.level", ValueType::Number)
            .with_allowed_values(vec![AllowedValue::text("high")]);
        assert!(matches!(
            validate_structured_property(&prop),
            Err(ValidationError::NonNumericAllowedValue { .. })
        ));
    }

    #[test]
    fn test_qualified_name_and_entity_types() {
        let prop = StructuredProperty::new("bad name", ValueType::String);
        assert!(matches!(
            validate_structured_property(&prop),
            Err(ValidationError::InvalidQualifiedName(_))
        ));

        let mut prop = StructuredProperty::new("io.acryl.tier", ValueType::String);
        prop.entity_types.clear();
        assert!(matches!(
            validate_structured_property(&prop),
            Err(ValidationError::MissingEntityTypes(_))
        ));
    }

    #[test]
    fn test_parse_value_type() {
        assert_eq!(parse_value_type("NUMBER").unwrap(), ValueType::Number);
        assert_eq!(
            parse_value_type("urn:li:dataType:datahub.urn").unwrap(),
            ValueType::Urn
        );
        assert!(matches!(
            parse_value_type("blob"),
            Err(ValidationError::UnknownValueType(_))
        ));
    }

    #[test]
    fn test_tag_color() {
        assert!(validate_tag(&Tag::new("PII").with_color("#a1B2c3")).is_ok());
        assert!(matches!(
            validate_tag(&Tag::new("PII").with_color("red")),
            Err(ValidationError::InvalidColor { .. })
        ));
        assert!(matches!(
            validate_tag(&Tag::new("  ")),
            Err(ValidationError::EmptyName { .. })
        ));
    }
}
