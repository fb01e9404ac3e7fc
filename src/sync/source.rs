//! Remote entity sources
//!
//! The DataHub client itself lives outside this crate. Anything that can
//! answer a paginated search implements [`MetadataSource`]; [`fetch_all`]
//! drives the pagination and parses the raw JSON rows into typed records.

use super::SyncError;
use super::remote::RemoteRecord;
use crate::urn::EntityType;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// One page of a search, shaped like DataHub's `searchAcrossEntities`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub start: usize,
    pub count: usize,
    pub total: usize,
    pub entities: Vec<Value>,
}

impl SearchPage {
    /// Parse a GraphQL search result (`{"start", "count", "total",
    /// "searchResults": [{"entity": {...}}]}`), optionally still wrapped in
    /// `{"data": {"searchAcrossEntities": ...}}`.
    pub fn from_graphql(value: &Value) -> Result<Self, SyncError> {
        let result = value
            .pointer("/data/searchAcrossEntities")
            .or_else(|| value.get("searchAcrossEntities"))
            .unwrap_or(value);

        let results = result
            .get("searchResults")
            .and_then(Value::as_array)
            .ok_or_else(|| SyncError::InvalidResponse("missing searchResults".to_string()))?;

        let read = |key: &str| result.get(key).and_then(Value::as_u64).map(|n| n as usize);
        let entities: Vec<Value> = results
            .iter()
            .filter_map(|r| r.get("entity").cloned())
            .collect();

        Ok(Self {
            start: read("start").unwrap_or(0),
            count: read("count").unwrap_or(entities.len()),
            total: read("total").unwrap_or(entities.len()),
            entities,
        })
    }
}

/// A paginated source of remote entities
#[async_trait(?Send)]
pub trait MetadataSource {
    async fn search(
        &self,
        entity_type: EntityType,
        start: usize,
        count: usize,
    ) -> Result<SearchPage, SyncError>;
}

#[async_trait(?Send)]
impl<S: MetadataSource + ?Sized> MetadataSource for &S {
    async fn search(
        &self,
        entity_type: EntityType,
        start: usize,
        count: usize,
    ) -> Result<SearchPage, SyncError> {
        (**self).search(entity_type, start, count).await
    }
}

/// Fetch every entity of `R`'s type, `page_size` rows at a time.
///
/// Stops once `total` rows have been seen or a page comes back empty. Rows
/// that do not parse as `R` are skipped with a warning.
pub async fn fetch_all<R, S>(source: &S, page_size: usize) -> Result<Vec<R>, SyncError>
where
    R: RemoteRecord,
    S: MetadataSource + ?Sized,
{
    if page_size == 0 {
        return Err(SyncError::InvalidArgument(
            "page size must be greater than zero".to_string(),
        ));
    }

    let mut records = Vec::new();
    let mut start = 0;
    loop {
        let page = source.search(R::ENTITY_TYPE, start, page_size).await?;
        let fetched = page.entities.len();
        debug!(
            "Fetched {} {} entities at offset {} (total {})",
            fetched,
            R::ENTITY_TYPE,
            start,
            page.total
        );

        for raw in page.entities {
            match serde_json::from_value::<R>(raw) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping malformed {} entity: {}", R::ENTITY_TYPE, e),
            }
        }

        start += fetched;
        if fetched == 0 || start >= page.total {
            break;
        }
    }
    Ok(records)
}

/// A [`MetadataSource`] over entities held in memory
///
/// Also used to replay a JSON snapshot of a DataHub instance: an object
/// keyed by entity type name (`"tag"`, `"domain"`, ...) holding arrays of
/// GraphQL-shaped entities.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    entities: HashMap<EntityType, Vec<Value>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entities(mut self, entity_type: EntityType, entities: Vec<Value>) -> Self {
        self.entities.entry(entity_type).or_default().extend(entities);
        self
    }

    pub fn insert(&mut self, entity_type: EntityType, entity: Value) {
        self.entities.entry(entity_type).or_default().push(entity);
    }

    pub fn from_snapshot(snapshot: &Value) -> Result<Self, SyncError> {
        let object = snapshot
            .as_object()
            .ok_or_else(|| SyncError::InvalidResponse("snapshot must be an object".to_string()))?;

        let mut source = Self::new();
        for (key, rows) in object {
            let entity_type: EntityType = match key.parse() {
                Ok(t) => t,
                Err(_) => {
                    warn!("Ignoring unknown entity type '{}' in snapshot", key);
                    continue;
                }
            };
            let rows = rows.as_array().ok_or_else(|| {
                SyncError::InvalidResponse(format!("snapshot entry '{}' must be an array", key))
            })?;
            source = source.with_entities(entity_type, rows.clone());
        }
        Ok(source)
    }

    pub fn len(&self, entity_type: EntityType) -> usize {
        self.entities.get(&entity_type).map_or(0, Vec::len)
    }
}

#[async_trait(?Send)]
impl MetadataSource for InMemorySource {
    async fn search(
        &self,
        entity_type: EntityType,
        start: usize,
        count: usize,
    ) -> Result<SearchPage, SyncError> {
        let all = self.entities.get(&entity_type).map(Vec::as_slice).unwrap_or(&[]);
        let entities: Vec<Value> = all.iter().skip(start).take(count).cloned().collect();
        Ok(SearchPage {
            start,
            count: entities.len(),
            total: all.len(),
            entities,
        })
    }
}
