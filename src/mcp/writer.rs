//! Idempotent MCP file writer
//!
//! Before a file is overwritten its existing content is compared with the new
//! content, ignoring timestamp fields at any depth. Equal content leaves the
//! file untouched. An existing file that cannot be read or parsed counts as
//! absent and is overwritten.

use super::builder::{BuildContext, EntityMcps};
use super::{Mcp, McpError};
use crate::storage::{StorageBackend, StorageError, join_path};
use crate::urn::Urn;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// Keys dropped before content comparison
pub const TIMESTAMP_FIELDS: &[&str] = &["time", "created", "lastModified", "lastComputed"];

/// Copy of `value` without timestamp keys, recursing through objects and arrays
pub fn remove_timestamp_fields(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| !TIMESTAMP_FIELDS.contains(&key.as_str()))
                .map(|(key, v)| (key.clone(), remove_timestamp_fields(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(remove_timestamp_fields).collect()),
        other => other.clone(),
    }
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let ordered: BTreeMap<&String, Value> =
                map.iter().map(|(key, v)| (key, sorted(v))).collect();
            let mut out = Map::new();
            for (key, v) in ordered {
                out.insert(key.clone(), v);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

/// Compact JSON with object keys sorted at every level
pub fn canonical_json(value: &Value) -> String {
    sorted(value).to_string()
}

/// SHA-256 (hex) of the canonical, timestamp-free form of `value`
pub fn content_hash(value: &Value) -> String {
    let canonical = canonical_json(&remove_timestamp_fields(value));
    format!("{:x}", Sha256::digest(canonical.as_bytes()))
}

/// Result of writing one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Unchanged,
}

/// Paths touched by a batch of writes, relative to the writer's base dir
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub created: Vec<String>,
    pub unchanged: Vec<String>,
}

impl WriteReport {
    pub fn record(&mut self, path: String, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Created => self.created.push(path),
            WriteOutcome::Unchanged => self.unchanged.push(path),
        }
    }

    pub fn merge(&mut self, other: WriteReport) {
        self.created.extend(other.created);
        self.unchanged.extend(other.unchanged);
    }

    pub fn total(&self) -> usize {
        self.created.len() + self.unchanged.len()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConsolidatedMetadata<'a> {
    environment: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mutation: Option<&'a str>,
    entity_count: usize,
    mcp_count: usize,
    created: i64,
}

#[derive(Debug, Serialize)]
struct ConsolidatedFile<'a> {
    mcps: Vec<&'a Mcp>,
    metadata: ConsolidatedMetadata<'a>,
}

fn aspect_path(entity: &EntityMcps, mcp: &Mcp) -> String {
    format!(
        "{}/{}/{}.json",
        entity.entity_type, entity.file_stem, mcp.aspect_name
    )
}

fn check_distinct_paths(entities: &[EntityMcps]) -> Result<(), McpError> {
    let mut owners: HashMap<String, &Urn> = HashMap::new();
    for entity in entities {
        for mcp in &entity.mcps {
            let path = aspect_path(entity, mcp);
            match owners.get(&path) {
                Some(first) if **first != entity.urn => {
                    return Err(McpError::PathCollision {
                        path,
                        first: first.to_string(),
                        second: entity.urn.to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    owners.insert(path, &entity.urn);
                }
            }
        }
    }
    Ok(())
}

/// Writes MCP JSON files below a base directory of a storage backend
pub struct McpWriter<B: StorageBackend> {
    storage: B,
    base_dir: String,
}

impl<B: StorageBackend> McpWriter<B> {
    pub fn new(storage: B, base_dir: impl Into<String>) -> Self {
        Self {
            storage,
            base_dir: base_dir.into(),
        }
    }

    pub fn storage(&self) -> &B {
        &self.storage
    }

    pub fn base_dir(&self) -> &str {
        &self.base_dir
    }

    /// Existing JSON at `full_path`, or `None` when missing or unusable
    async fn read_existing(&self, full_path: &str) -> Option<Value> {
        let bytes = match self.storage.read_file(full_path).await {
            Ok(bytes) => bytes,
            Err(StorageError::FileNotFound(_)) => return None,
            Err(e) => {
                warn!("Could not read existing MCP file {}: {}", full_path, e);
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Existing MCP file {} is not valid JSON: {}", full_path, e);
                None
            }
        }
    }

    /// Write `value` to `path` (relative to the base dir) unless equivalent
    /// content is already there.
    ///
    /// Returns `true` when the file was written and `false` when it was left
    /// untouched.
    pub async fn save_mcp_to_file(&self, value: &Value, path: &str) -> Result<bool, McpError> {
        let full_path = join_path(&self.base_dir, path);

        if let Some(existing) = self.read_existing(&full_path).await {
            let before = canonical_json(&remove_timestamp_fields(&existing));
            let after = canonical_json(&remove_timestamp_fields(value));
            if before == after {
                debug!("MCP file {} unchanged, skipping write", full_path);
                return Ok(false);
            }
        }

        let mut bytes = serde_json::to_vec_pretty(value).map_err(|e| McpError::Serialization {
            aspect: path.to_string(),
            message: e.to_string(),
        })?;
        bytes.push(b'\n');
        self.storage.write_file(&full_path, &bytes).await?;
        debug!("Wrote MCP file {}", full_path);
        Ok(true)
    }

    async fn save(&self, value: &Value, path: String, report: &mut WriteReport) -> Result<(), McpError> {
        let outcome = if self.save_mcp_to_file(value, &path).await? {
            WriteOutcome::Created
        } else {
            WriteOutcome::Unchanged
        };
        report.record(path, outcome);
        Ok(())
    }

    /// Write one file per aspect: `<entityType>/<file_stem>/<aspectName>.json`
    pub async fn write_entity_mcps(&self, entity: &EntityMcps) -> Result<WriteReport, McpError> {
        let mut report = WriteReport::default();
        for mcp in &entity.mcps {
            self.save(&mcp.to_value()?, aspect_path(entity, mcp), &mut report)
                .await?;
        }
        Ok(report)
    }

    /// Write per-aspect files for many entities. Nothing is written when two
    /// different URNs would share a file.
    pub async fn write_all(&self, entities: &[EntityMcps]) -> Result<WriteReport, McpError> {
        check_distinct_paths(entities)?;
        let mut report = WriteReport::default();
        for entity in entities {
            report.merge(self.write_entity_mcps(entity).await?);
        }
        info!(
            "MCP files: {} created, {} unchanged",
            report.created.len(),
            report.unchanged.len()
        );
        Ok(report)
    }

    /// Write every MCP into one `{"mcps": [...], "metadata": {...}}` file
    pub async fn write_consolidated(
        &self,
        path: &str,
        entities: &[EntityMcps],
        ctx: &BuildContext,
    ) -> Result<WriteReport, McpError> {
        let mcps: Vec<&Mcp> = entities.iter().flat_map(|e| e.mcps.iter()).collect();
        let file = ConsolidatedFile {
            metadata: ConsolidatedMetadata {
                environment: &ctx.environment,
                mutation: ctx.mutation.as_deref(),
                entity_count: entities.len(),
                mcp_count: mcps.len(),
                created: ctx.now_millis,
            },
            mcps,
        };
        let value = serde_json::to_value(&file).map_err(|e| McpError::Serialization {
            aspect: path.to_string(),
            message: e.to_string(),
        })?;
        let mut report = WriteReport::default();
        self.save(&value, path.to_string(), &mut report).await?;
        Ok(report)
    }
}
