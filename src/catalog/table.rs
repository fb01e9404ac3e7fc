//! Rows of one entity type with lifecycle operations

use super::CatalogError;
use crate::models::{ConnectionId, Entity, SyncStatus};
use crate::sync::StatusUpdate;
use crate::urn::Urn;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Local rows of one entity type.
///
/// A URN appears at most once per connection. The same remote entity may
/// still be held once for each connection it was pulled from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityTable<E> {
    rows: Vec<E>,
}

impl<E> Default for EntityTable<E> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<E: Entity + Clone> EntityTable<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table, rejecting duplicate URNs
    pub fn from_rows(rows: Vec<E>) -> Result<Self, CatalogError> {
        let mut table = Self::new();
        for row in rows {
            table.check_unique(&row, None)?;
            table.rows.push(row);
        }
        Ok(table)
    }

    pub fn rows(&self) -> &[E] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&E> {
        self.rows.get(index)
    }

    pub fn position_by_id(&self, id: Uuid) -> Option<usize> {
        self.rows.iter().position(|r| r.meta().id == id)
    }

    pub fn find_by_urn(&self, urn: &Urn, connection: Option<&ConnectionId>) -> Option<usize> {
        self.rows.iter().position(|r| {
            r.meta().urn.as_ref() == Some(urn) && r.meta().connection.as_ref() == connection
        })
    }

    fn check_unique(&self, row: &E, skip: Option<usize>) -> Result<(), CatalogError> {
        let Some(urn) = &row.meta().urn else {
            return Ok(());
        };
        let connection = row.meta().connection.as_ref();
        match self.find_by_urn(urn, connection) {
            Some(existing) if Some(existing) != skip => Err(CatalogError::DuplicateUrn {
                urn: urn.to_string(),
                connection: connection.map(ToString::to_string),
            }),
            _ => Ok(()),
        }
    }

    fn row_mut(&mut self, index: usize) -> Result<&mut E, CatalogError> {
        let len = self.rows.len();
        self.rows
            .get_mut(index)
            .ok_or(CatalogError::RowNotFound { index, len })
    }

    /// Add a row created by a local user action. It starts as `LOCAL_ONLY`.
    pub fn create_local(&mut self, mut entity: E) -> Result<usize, CatalogError> {
        self.check_unique(&entity, None)?;
        let meta = entity.meta_mut();
        meta.sync_status = SyncStatus::LocalOnly;
        meta.touch();
        self.rows.push(entity);
        Ok(self.rows.len() - 1)
    }

    /// Insert or refresh a row pulled from DataHub.
    ///
    /// A row with the same URN and connection is replaced in place, keeping
    /// its local id and creation time. The row ends up `SYNCED`.
    pub fn upsert_pulled(&mut self, mut entity: E) -> Result<usize, CatalogError> {
        let urn = entity
            .meta()
            .urn
            .clone()
            .ok_or_else(|| CatalogError::MissingUrn(entity.name().to_string()))?;
        let connection = entity.meta().connection.clone();

        {
            let meta = entity.meta_mut();
            meta.sync_status = meta.sync_status.after_pull();
            if meta.datahub_id.is_none() {
                meta.datahub_id = Some(urn.id().to_string());
            }
            meta.touch();
        }

        match self.find_by_urn(&urn, connection.as_ref()) {
            Some(index) => {
                let existing = &self.rows[index];
                let id = existing.meta().id;
                let created_at = existing.meta().created_at;
                let meta = entity.meta_mut();
                meta.id = id;
                meta.created_at = created_at;
                self.rows[index] = entity;
                Ok(index)
            }
            None => {
                self.rows.push(entity);
                Ok(self.rows.len() - 1)
            }
        }
    }

    /// Apply a user edit to a row.
    ///
    /// Rows that mirrored DataHub become `MODIFIED`. An edit that would give
    /// the row a URN already held by another row is rolled back.
    pub fn edit(&mut self, index: usize, f: impl FnOnce(&mut E)) -> Result<(), CatalogError> {
        let before = self.row_mut(index)?.clone();
        let row = self.row_mut(index)?;
        f(row);
        let edited = row.clone();
        if let Err(e) = self.check_unique(&edited, Some(index)) {
            self.rows[index] = before;
            return Err(e);
        }
        let meta = self.rows[index].meta_mut();
        meta.sync_status = meta.sync_status.after_local_edit();
        meta.touch();
        Ok(())
    }

    /// The row's MCP files were staged for review
    pub fn mark_staged(&mut self, index: usize) -> Result<(), CatalogError> {
        let meta = self.row_mut(index)?.meta_mut();
        meta.sync_status = meta.sync_status.after_staged();
        meta.touch();
        Ok(())
    }

    /// The row reached DataHub, under `urn` when given
    pub fn mark_pushed(&mut self, index: usize, urn: Option<Urn>) -> Result<(), CatalogError> {
        if let Some(urn) = &urn {
            let mut candidate = self.row_mut(index)?.clone();
            candidate.meta_mut().urn = Some(urn.clone());
            self.check_unique(&candidate, Some(index))?;
        }
        let meta = self.row_mut(index)?.meta_mut();
        if let Some(urn) = urn {
            meta.datahub_id = Some(urn.id().to_string());
            meta.urn = Some(urn);
        }
        meta.sync_status = meta.sync_status.after_push();
        meta.touch();
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<E, CatalogError> {
        self.row_mut(index)?;
        Ok(self.rows.remove(index))
    }

    /// Apply reconciliation results, skipping URN adoptions that would clash
    /// with another row. Returns the number of rows updated.
    pub fn apply_status_updates(&mut self, updates: &[StatusUpdate]) -> usize {
        let mut accepted = Vec::with_capacity(updates.len());
        for update in updates {
            let Some(row) = self.rows.get(update.local_index) else {
                continue;
            };
            let clashes = update.adopt_urn.as_ref().is_some_and(|urn| {
                let mut candidate = row.clone();
                candidate.meta_mut().urn = Some(urn.clone());
                self.check_unique(&candidate, Some(update.local_index)).is_err()
            });
            if clashes {
                tracing::warn!(
                    "Not adopting URN for '{}': already used by another row",
                    row.name()
                );
                let mut update = update.clone();
                update.adopt_urn = None;
                accepted.push(update);
            } else {
                accepted.push(update.clone());
            }
        }
        crate::sync::apply_status_updates(&mut self.rows, &accepted)
    }
}

impl<E> IntoIterator for EntityTable<E> {
    type Item = E;
    type IntoIter = std::vec::IntoIter<E>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityMeta, Tag};
    use crate::urn::EntityType;

    fn pulled(name: &str, id: &str, conn: Option<&str>) -> Tag {
        let mut tag = Tag::new(name);
        tag.meta = EntityMeta::pulled(Urn::new(EntityType::Tag, id), conn.map(ConnectionId::from));
        tag
    }

    #[test]
    fn test_create_local() {
        let mut table = EntityTable::new();
        let idx = table.create_local(Tag::new("PII")).unwrap();
        assert_eq!(table.rows()[idx].meta.sync_status, SyncStatus::LocalOnly);
    }

    #[test]
    fn test_urn_unique_per_connection() {
        let mut table = EntityTable::new();
        table.upsert_pulled(pulled("PII", "pii", Some("prod"))).unwrap();
        table.upsert_pulled(pulled("PII", "pii", Some("dev"))).unwrap();
        assert_eq!(table.len(), 2);

        let err = table.create_local(pulled("PII", "pii", Some("prod"))).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateUrn { .. }));

        assert!(EntityTable::from_rows(vec![pulled("A", "a", None), pulled("A", "a", None)]).is_err());
    }

    #[test]
    fn test_upsert_pulled_replaces_in_place() {
        let mut table = EntityTable::new();
        let first = table.upsert_pulled(pulled("PII", "pii", None)).unwrap();
        let id = table.rows()[first].meta.id;
        let second = table
            .upsert_pulled(pulled("PII", "pii", None).with_description("updated"))
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].meta.id, id);
        assert_eq!(table.rows()[0].description.as_deref(), Some("updated"));
    }

    #[test]
    fn test_upsert_pulled_requires_urn() {
        let mut table = EntityTable::new();
        assert!(matches!(
            table.upsert_pulled(Tag::new("PII")),
            Err(CatalogError::MissingUrn(_))
        ));
    }

    #[test]
    fn test_lifecycle() {
        let mut table = EntityTable::new();
        let idx = table.upsert_pulled(pulled("PII", "pii", None)).unwrap();
        table
            .edit(idx, |t| t.description = Some("changed".to_string()))
            .unwrap();
        assert_eq!(table.rows()[idx].meta.sync_status, SyncStatus::Modified);
        table.mark_staged(idx).unwrap();
        assert_eq!(table.rows()[idx].meta.sync_status, SyncStatus::PendingPush);
        table.mark_pushed(idx, None).unwrap();
        assert_eq!(table.rows()[idx].meta.sync_status, SyncStatus::Synced);
    }

    #[test]
    fn test_edit_rolls_back_urn_clash() {
        let mut table = EntityTable::new();
        table.upsert_pulled(pulled("A", "a", None)).unwrap();
        let idx = table.create_local(Tag::new("B")).unwrap();
        let err = table.edit(idx, |t| {
            t.name = "renamed".to_string();
            t.meta.urn = Some(Urn::new(EntityType::Tag, "a"));
        });
        assert!(err.is_err());
        assert_eq!(table.rows()[idx].name, "B");
        assert!(table.rows()[idx].meta.urn.is_none());
    }

    #[test]
    fn test_missing_row() {
        let mut table: EntityTable<Tag> = EntityTable::new();
        assert!(matches!(
            table.mark_staged(3),
            Err(CatalogError::RowNotFound { index: 3, len: 0 })
        ));
    }
}
