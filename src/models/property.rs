//! Structured property model

use super::entity::EntityMeta;
use super::Entity;
use crate::urn::EntityType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Value type of a structured property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    #[default]
    String,
    RichText,
    Number,
    Date,
    Urn,
}

impl ValueType {
    /// DataHub data type URN for this value type
    pub fn datahub_urn(&self) -> &'static str {
        match self {
            ValueType::String => "urn:li:dataType:datahub.string",
            ValueType::RichText => "urn:li:dataType:datahub.rich_text",
            ValueType::Number => "urn:li:dataType:datahub.number",
            ValueType::Date => "urn:li:dataType:datahub.date",
            ValueType::Urn => "urn:li:dataType:datahub.urn",
        }
    }

    /// Parse a DataHub data type URN or its short name
    pub fn from_datahub(value: &str) -> Option<Self> {
        let short = value
            .strip_prefix("urn:li:dataType:datahub.")
            .unwrap_or(value);
        short.to_ascii_lowercase().parse().ok()
    }
}

impl FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(ValueType::String),
            "rich_text" => Ok(ValueType::RichText),
            "number" => Ok(ValueType::Number),
            "date" => Ok(ValueType::Date),
            "urn" => Ok(ValueType::Urn),
            other => Err(format!("Unknown value type: {}", other)),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::String => "string",
            ValueType::RichText => "rich_text",
            ValueType::Number => "number",
            ValueType::Date => "date",
            ValueType::Urn => "urn",
        };
        f.write_str(name)
    }
}

/// Whether a property holds one value or many
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cardinality {
    #[default]
    Single,
    Multiple,
}

impl Cardinality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinality::Single => "SINGLE",
            Cardinality::Multiple => "MULTIPLE",
        }
    }
}

/// A single property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Number(f64),
    Text(String),
}

impl PropertyValue {
    /// Comparison key: trimmed text, or the number's shortest form
    pub fn normalized(&self) -> String {
        match self {
            PropertyValue::Number(n) => n.to_string(),
            PropertyValue::Text(s) => s.trim().to_string(),
        }
    }

    /// Numeric reading of the value, if any
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            PropertyValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// One entry of a property's allowed-value list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowedValue {
    pub value: PropertyValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AllowedValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: PropertyValue::Text(value.into()),
            description: None,
        }
    }
}

/// A structured property definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredProperty {
    #[serde(flatten)]
    pub meta: EntityMeta,
    /// Fully qualified name, e.g. `io.acryl.privacy.retentionTime`
    pub qualified_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub value_type: ValueType,
    #[serde(default)]
    pub cardinality: Cardinality,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<AllowedValue>,
    /// Entity types the property applies to, e.g. `dataset`
    #[serde(default)]
    pub entity_types: Vec<String>,
    #[serde(default)]
    pub immutable: bool,
}

impl StructuredProperty {
    pub fn new(qualified_name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            meta: EntityMeta::local(),
            qualified_name: qualified_name.into(),
            display_name: None,
            description: None,
            value_type,
            cardinality: Cardinality::Single,
            allowed_values: Vec::new(),
            entity_types: vec!["dataset".to_string()],
            immutable: false,
        }
    }

    pub fn with_allowed_values(mut self, values: Vec<AllowedValue>) -> Self {
        self.allowed_values = values;
        self
    }

    /// DataHub entity type URNs for `entity_types`
    pub fn entity_type_urns(&self) -> Vec<String> {
        self.entity_types
            .iter()
            .map(|t| {
                if t.starts_with("urn:li:entityType:") {
                    t.clone()
                } else {
                    format!("urn:li:entityType:datahub.{}", t.trim())
                }
            })
            .collect()
    }
}

impl Entity for StructuredProperty {
    const ENTITY_TYPE: EntityType = EntityType::StructuredProperty;

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.qualified_name)
    }

    fn identity_key(&self) -> String {
        self.qualified_name.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_from_datahub() {
        assert_eq!(
            ValueType::from_datahub("urn:li:dataType:datahub.rich_text"),
            Some(ValueType::RichText)
        );
        assert_eq!(ValueType::from_datahub("NUMBER"), Some(ValueType::Number));
        assert_eq!(ValueType::from_datahub("blob"), None);
    }

    #[test]
    fn test_allowed_value_untagged() {
        let values: Vec<AllowedValue> =
            serde_json::from_str(r#"[{"value": "A"}, {"value": 3.5, "description": "x"}]"#)
                .unwrap();
        assert_eq!(values[0].value, PropertyValue::Text("A".to_string()));
        assert_eq!(values[1].value.as_number(), Some(3.5));
    }

    #[test]
    fn test_name_falls_back_to_qualified_name() {
        let prop = StructuredProperty::new("io.acryl.retention", ValueType::Number);
        assert_eq!(prop.name(), "io.acryl.retention");
        assert_eq!(
            prop.entity_type_urns(),
            vec!["urn:li:entityType:datahub.dataset".to_string()]
        );
    }
}
