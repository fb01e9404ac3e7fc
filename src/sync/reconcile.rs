//! Local/remote reconciliation
//!
//! Each local row is matched to at most one remote entity, trying the URN
//! first, then the `datahub_id`, then (for rows that were never pushed) the
//! name. Matched pairs are compared field by field on normalized values.
//!
//! Nothing here mutates local rows. [`reconcile`] proposes [`StatusUpdate`]s
//! and [`apply_status_updates`] writes them when the caller decides to.

use crate::models::{
    Assertion, Domain, Entity, GlossaryNode, GlossaryTerm, StructuredProperty, SyncStatus, Tag,
};
use crate::urn::Urn;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Comparable field values keyed by field name. `None` means absent or empty.
pub type FieldMap = BTreeMap<&'static str, Option<String>>;

/// Trimmed text, with empty strings treated as absent
pub fn normalize_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Color hex upper-cased so `#ff0000` and `#FF0000` compare equal
pub fn normalize_color(value: Option<&str>) -> Option<String> {
    normalize_text(value).map(|c| c.to_ascii_uppercase())
}

/// Sorted, comma-joined list; an empty list is absent
pub fn join_sorted<I: IntoIterator<Item = String>>(values: I) -> Option<String> {
    let mut values: Vec<String> = values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    if values.is_empty() {
        return None;
    }
    values.sort();
    values.dedup();
    Some(values.join(","))
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Either side of a reconciliation
pub trait SyncRecord {
    fn sync_urn(&self) -> Option<&str>;

    fn sync_datahub_id(&self) -> Option<&str>;

    fn sync_name(&self) -> &str;

    fn comparable_fields(&self) -> FieldMap;
}

/// A local row as seen by reconciliation
///
/// `index` points back into the caller's row list so updates can be applied
/// later. `parent_urn` carries the already resolved parent for hierarchical
/// entities.
#[derive(Debug, Clone)]
pub struct LocalView<'a, E> {
    pub index: usize,
    pub entity: &'a E,
    pub parent_urn: Option<Urn>,
}

impl<'a, E: Entity> LocalView<'a, E> {
    pub fn new(index: usize, entity: &'a E) -> Self {
        Self {
            index,
            entity,
            parent_urn: None,
        }
    }

    pub fn with_parent(mut self, parent_urn: Option<Urn>) -> Self {
        self.parent_urn = parent_urn;
        self
    }

    fn status(&self) -> SyncStatus {
        self.entity.meta().sync_status
    }

    fn urn(&self) -> Option<&str> {
        self.entity.meta().urn.as_ref().map(Urn::as_str)
    }

    fn datahub_id(&self) -> Option<&str> {
        self.entity.meta().effective_datahub_id()
    }
}

impl SyncRecord for LocalView<'_, Tag> {
    fn sync_urn(&self) -> Option<&str> {
        self.urn()
    }

    fn sync_datahub_id(&self) -> Option<&str> {
        self.datahub_id()
    }

    fn sync_name(&self) -> &str {
        &self.entity.name
    }

    fn comparable_fields(&self) -> FieldMap {
        FieldMap::from([
            ("name", normalize_text(Some(&self.entity.name))),
            ("description", normalize_text(self.entity.description.as_deref())),
            ("color", normalize_color(self.entity.color_hex.as_deref())),
        ])
    }
}

impl SyncRecord for LocalView<'_, Domain> {
    fn sync_urn(&self) -> Option<&str> {
        self.urn()
    }

    fn sync_datahub_id(&self) -> Option<&str> {
        self.datahub_id()
    }

    fn sync_name(&self) -> &str {
        &self.entity.name
    }

    fn comparable_fields(&self) -> FieldMap {
        FieldMap::from([
            ("name", normalize_text(Some(&self.entity.name))),
            ("description", normalize_text(self.entity.description.as_deref())),
            ("parent", self.parent_urn.as_ref().map(Urn::to_string)),
        ])
    }
}

impl SyncRecord for LocalView<'_, GlossaryNode> {
    fn sync_urn(&self) -> Option<&str> {
        self.urn()
    }

    fn sync_datahub_id(&self) -> Option<&str> {
        self.datahub_id()
    }

    fn sync_name(&self) -> &str {
        &self.entity.name
    }

    fn comparable_fields(&self) -> FieldMap {
        FieldMap::from([
            ("name", normalize_text(Some(&self.entity.name))),
            ("description", normalize_text(self.entity.description.as_deref())),
            ("parent", self.parent_urn.as_ref().map(Urn::to_string)),
        ])
    }
}

impl SyncRecord for LocalView<'_, GlossaryTerm> {
    fn sync_urn(&self) -> Option<&str> {
        self.urn()
    }

    fn sync_datahub_id(&self) -> Option<&str> {
        self.datahub_id()
    }

    fn sync_name(&self) -> &str {
        &self.entity.name
    }

    fn comparable_fields(&self) -> FieldMap {
        FieldMap::from([
            ("name", normalize_text(Some(&self.entity.name))),
            ("description", normalize_text(self.entity.description.as_deref())),
            ("parent", self.parent_urn.as_ref().map(Urn::to_string)),
        ])
    }
}

impl SyncRecord for LocalView<'_, StructuredProperty> {
    fn sync_urn(&self) -> Option<&str> {
        self.urn()
    }

    fn sync_datahub_id(&self) -> Option<&str> {
        self.datahub_id()
    }

    fn sync_name(&self) -> &str {
        &self.entity.qualified_name
    }

    fn comparable_fields(&self) -> FieldMap {
        let p = self.entity;
        let entity_types = p.entity_types.iter().map(|t| {
            t.trim()
                .strip_prefix("urn:li:entityType:datahub.")
                .unwrap_or(t.trim())
                .to_string()
        });
        FieldMap::from([
            ("display_name", normalize_text(p.display_name.as_deref())),
            ("description", normalize_text(p.description.as_deref())),
            ("value_type", Some(p.value_type.to_string())),
            ("cardinality", Some(p.cardinality.as_str().to_string())),
            (
                "allowed_values",
                join_sorted(p.allowed_values.iter().map(|v| v.value.normalized())),
            ),
            ("entity_types", join_sorted(entity_types)),
            ("immutable", Some(p.immutable.to_string())),
        ])
    }
}

impl SyncRecord for LocalView<'_, Assertion> {
    fn sync_urn(&self) -> Option<&str> {
        self.urn()
    }

    fn sync_datahub_id(&self) -> Option<&str> {
        self.datahub_id()
    }

    fn sync_name(&self) -> &str {
        &self.entity.name
    }

    fn comparable_fields(&self) -> FieldMap {
        FieldMap::from([
            ("type", Some(self.entity.assertion_type.as_str().to_string())),
            ("description", normalize_text(self.entity.description.as_deref())),
            ("external_url", normalize_text(self.entity.external_url.as_deref())),
        ])
    }
}

/// How a local row found its remote counterpart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Urn,
    DatahubId,
    Name,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDiff {
    pub field: &'static str,
    pub local: Option<String>,
    pub remote: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchedPair<R> {
    pub local_index: usize,
    pub local_name: String,
    pub remote: R,
    pub matched_by: MatchKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diffs: Vec<FieldDiff>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalOnlyEntry {
    pub local_index: usize,
    pub local_name: String,
}

/// A proposed sync status change for one local row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusUpdate {
    pub local_index: usize,
    pub from: SyncStatus,
    pub to: SyncStatus,
    /// Remote URN to record on a row that matched without its own URN
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adopt_urn: Option<Urn>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport<R> {
    pub synced: Vec<MatchedPair<R>>,
    pub modified: Vec<MatchedPair<R>>,
    pub local_only: Vec<LocalOnlyEntry>,
    pub remote_only: Vec<R>,
    pub status_updates: Vec<StatusUpdate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SyncSummary {
    pub synced: usize,
    pub modified: usize,
    pub local_only: usize,
    pub remote_only: usize,
}

impl<R> SyncReport<R> {
    pub fn summary(&self) -> SyncSummary {
        SyncSummary {
            synced: self.synced.len(),
            modified: self.modified.len(),
            local_only: self.local_only.len(),
            remote_only: self.remote_only.len(),
        }
    }
}

fn diff_fields(local: &FieldMap, remote: &FieldMap) -> Vec<FieldDiff> {
    let mut diffs = Vec::new();
    for (field, local_value) in local {
        let remote_value = remote.get(field).cloned().flatten();
        if *local_value != remote_value {
            diffs.push(FieldDiff {
                field,
                local: local_value.clone(),
                remote: remote_value,
            });
        }
    }
    for (field, remote_value) in remote {
        if !local.contains_key(field) && remote_value.is_some() {
            diffs.push(FieldDiff {
                field,
                local: None,
                remote: remote_value.clone(),
            });
        }
    }
    diffs
}

/// Status a row should move to, or `None` to leave it alone.
///
/// A row waiting for its push keeps `PENDING_PUSH` unless the remote already
/// matches it exactly.
fn proposed_status(current: SyncStatus, target: SyncStatus) -> Option<SyncStatus> {
    if current == target {
        return None;
    }
    if current == SyncStatus::PendingPush && target != SyncStatus::Synced {
        return None;
    }
    Some(target)
}

/// Match local rows against remote entities and classify both sides
pub fn reconcile<'a, E, R>(locals: &[LocalView<'a, E>], remotes: Vec<R>) -> SyncReport<R>
where
    E: Entity,
    LocalView<'a, E>: SyncRecord,
    R: SyncRecord,
{
    let mut remote_slots: Vec<Option<R>> = remotes.into_iter().map(Some).collect();
    let mut local_match: Vec<Option<(usize, MatchKind)>> = vec![None; locals.len()];

    // Ids and names may repeat across remotes; each key keeps every
    // candidate so a taken one does not hide the rest.
    let mut by_urn: HashMap<String, Vec<usize>> = HashMap::new();
    let mut by_id: HashMap<String, Vec<usize>> = HashMap::new();
    let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, remote) in remote_slots.iter().enumerate() {
        let Some(remote) = remote else { continue };
        if let Some(urn) = remote.sync_urn() {
            by_urn.entry(urn.to_string()).or_default().push(idx);
        }
        if let Some(id) = remote.sync_datahub_id() {
            by_id.entry(id.to_string()).or_default().push(idx);
        }
        by_name
            .entry(name_key(remote.sync_name()))
            .or_default()
            .push(idx);
    }

    let mut taken = vec![false; remote_slots.len()];
    let passes = [MatchKind::Urn, MatchKind::DatahubId, MatchKind::Name];
    for kind in passes {
        for (li, local) in locals.iter().enumerate() {
            if local_match[li].is_some() {
                continue;
            }
            let candidates = match kind {
                MatchKind::Urn => local.sync_urn().and_then(|u| by_urn.get(u)),
                MatchKind::DatahubId => local.sync_datahub_id().and_then(|id| by_id.get(id)),
                // Only rows that never had a remote identity fall back to names
                MatchKind::Name if local.sync_urn().is_none() => {
                    by_name.get(&name_key(local.sync_name()))
                }
                MatchKind::Name => None,
            };
            let free = candidates
                .into_iter()
                .flatten()
                .copied()
                .find(|&ri| !taken[ri]);
            if let Some(ri) = free {
                taken[ri] = true;
                local_match[li] = Some((ri, kind));
            }
        }
    }

    let mut report = SyncReport {
        synced: Vec::new(),
        modified: Vec::new(),
        local_only: Vec::new(),
        remote_only: Vec::new(),
        status_updates: Vec::new(),
    };

    for (li, local) in locals.iter().enumerate() {
        let current = local.status();
        let Some((ri, kind)) = local_match[li] else {
            if let Some(to) = proposed_status(current, SyncStatus::LocalOnly) {
                report.status_updates.push(StatusUpdate {
                    local_index: local.index,
                    from: current,
                    to,
                    adopt_urn: None,
                });
            }
            report.local_only.push(LocalOnlyEntry {
                local_index: local.index,
                local_name: local.sync_name().to_string(),
            });
            continue;
        };

        let Some(remote) = remote_slots[ri].take() else {
            continue;
        };
        let diffs = diff_fields(&local.comparable_fields(), &remote.comparable_fields());
        let target = if diffs.is_empty() {
            SyncStatus::Synced
        } else {
            SyncStatus::Modified
        };

        let adopt_urn = remote
            .sync_urn()
            .filter(|remote_urn| local.sync_urn() != Some(*remote_urn))
            .and_then(|u| Urn::parse(u).ok());
        let to = proposed_status(current, target);
        if to.is_some() || adopt_urn.is_some() {
            report.status_updates.push(StatusUpdate {
                local_index: local.index,
                from: current,
                to: to.unwrap_or(current),
                adopt_urn,
            });
        }

        debug!(
            "Matched '{}' by {:?} with {} differing fields",
            local.sync_name(),
            kind,
            diffs.len()
        );
        let pair = MatchedPair {
            local_index: local.index,
            local_name: local.sync_name().to_string(),
            remote,
            matched_by: kind,
            diffs,
        };
        if pair.diffs.is_empty() {
            report.synced.push(pair);
        } else {
            report.modified.push(pair);
        }
    }

    report.remote_only = remote_slots.into_iter().flatten().collect();
    report
}

/// Write proposed status changes to the rows they were computed for.
///
/// Returns the number of rows updated. Updates whose index is out of range
/// are ignored.
pub fn apply_status_updates<E: Entity>(rows: &mut [E], updates: &[StatusUpdate]) -> usize {
    let mut applied = 0;
    for update in updates {
        let Some(row) = rows.get_mut(update.local_index) else {
            continue;
        };
        let meta = row.meta_mut();
        meta.sync_status = update.to;
        if let Some(urn) = &update.adopt_urn {
            meta.datahub_id = Some(urn.id().to_string());
            meta.urn = Some(urn.clone());
        }
        meta.touch();
        applied += 1;
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::urn::EntityType;

    #[derive(Debug, Clone)]
    struct Remote {
        urn: &'static str,
        name: &'static str,
        description: Option<&'static str>,
    }

    impl SyncRecord for Remote {
        fn sync_urn(&self) -> Option<&str> {
            Some(self.urn)
        }

        fn sync_datahub_id(&self) -> Option<&str> {
            self.urn.rsplit(':').next()
        }

        fn sync_name(&self) -> &str {
            self.name
        }

        fn comparable_fields(&self) -> FieldMap {
            FieldMap::from([
                ("name", normalize_text(Some(self.name))),
                ("description", normalize_text(self.description)),
                ("color", None),
            ])
        }
    }

    fn remote(urn: &'static str, name: &'static str) -> Remote {
        Remote {
            urn,
            name,
            description: None,
        }
    }

    fn pulled_tag(name: &str, id: &str) -> Tag {
        let mut tag = Tag::new(name);
        tag.meta = crate::models::EntityMeta::pulled(Urn::new(EntityType::Tag, id), None);
        tag
    }

    fn views(tags: &[Tag]) -> Vec<LocalView<'_, Tag>> {
        tags.iter()
            .enumerate()
            .map(|(i, t)| LocalView::new(i, t))
            .collect()
    }

    #[test]
    fn test_normalization() {
        assert_eq!(normalize_text(Some("  ")), None);
        assert_eq!(normalize_text(Some(" a ")), Some("a".to_string()));
        assert_eq!(normalize_color(Some("#ab12cd")), Some("#AB12CD".to_string()));
        assert_eq!(
            join_sorted(vec!["b".to_string(), "a".to_string(), "".to_string()]),
            Some("a,b".to_string())
        );
        assert_eq!(join_sorted(Vec::<String>::new()), None);
    }

    #[test]
    fn test_match_by_urn_synced() {
        let tags = vec![pulled_tag("PII", "pii")];
        let report = reconcile(&views(&tags), vec![remote("urn:li:tag:pii", "PII")]);
        assert_eq!(report.synced.len(), 1);
        assert_eq!(report.synced[0].matched_by, MatchKind::Urn);
        assert!(report.status_updates.is_empty());
    }

    #[test]
    fn test_modified_reports_diffs() {
        let tags = vec![pulled_tag("PII", "pii").with_description("local text")];
        let mut r = remote("urn:li:tag:pii", "PII");
        r.description = Some("remote text");
        let report = reconcile(&views(&tags), vec![r]);
        assert_eq!(report.modified.len(), 1);
        let diff = &report.modified[0].diffs[0];
        assert_eq!(diff.field, "description");
        assert_eq!(diff.local.as_deref(), Some("local text"));
        assert_eq!(report.status_updates[0].to, SyncStatus::Modified);
    }

    #[test]
    fn test_name_fallback_only_without_urn() {
        let local = Tag::new("PII ");
        let stale = pulled_tag("Finance", "gone");
        let tags = vec![local, stale];
        let report = reconcile(
            &views(&tags),
            vec![remote("urn:li:tag:pii", "PII"), remote("urn:li:tag:fin2", "finance")],
        );
        assert_eq!(report.synced.len(), 1);
        assert_eq!(report.synced[0].matched_by, MatchKind::Name);
        assert_eq!(report.local_only.len(), 1);
        assert_eq!(report.local_only[0].local_name, "Finance");
        assert_eq!(report.remote_only.len(), 1);

        let adopt = report
            .status_updates
            .iter()
            .find(|u| u.local_index == 0)
            .unwrap();
        assert_eq!(adopt.to, SyncStatus::Synced);
        assert_eq!(adopt.adopt_urn.as_ref().map(Urn::as_str), Some("urn:li:tag:pii"));
    }

    #[test]
    fn test_remote_matched_at_most_once() {
        let tags = vec![Tag::new("PII"), Tag::new("pii")];
        let report = reconcile(&views(&tags), vec![remote("urn:li:tag:pii", "PII")]);
        assert_eq!(report.synced.len(), 1);
        assert_eq!(report.local_only.len(), 1);
        assert!(report.remote_only.is_empty());
    }

    #[test]
    fn test_pending_push_not_downgraded() {
        let mut tag = Tag::new("Draft");
        tag.meta.sync_status = SyncStatus::PendingPush;
        let mut changed = pulled_tag("PII", "pii").with_description("new");
        changed.meta.sync_status = SyncStatus::PendingPush;
        let tags = vec![tag, changed];
        let report = reconcile(&views(&tags), vec![remote("urn:li:tag:pii", "PII")]);
        assert_eq!(report.local_only.len(), 1);
        assert_eq!(report.modified.len(), 1);
        assert!(report.status_updates.is_empty());
    }

    #[test]
    fn test_pending_push_promoted_when_remote_matches() {
        let mut tag = pulled_tag("PII", "pii");
        tag.meta.sync_status = SyncStatus::PendingPush;
        let tags = vec![tag];
        let report = reconcile(&views(&tags), vec![remote("urn:li:tag:pii", "PII")]);
        assert_eq!(report.status_updates[0].to, SyncStatus::Synced);
    }

    #[test]
    fn test_apply_status_updates() {
        let mut tags = vec![Tag::new("PII")];
        let report = reconcile(&views(&tags), vec![remote("urn:li:tag:pii", "PII")]);
        let updates = report.status_updates.clone();
        assert_eq!(apply_status_updates(&mut tags, &updates), 1);
        assert_eq!(tags[0].meta.sync_status, SyncStatus::Synced);
        assert_eq!(tags[0].meta.datahub_id.as_deref(), Some("pii"));
        assert_eq!(
            tags[0].meta.urn.as_ref().map(Urn::as_str),
            Some("urn:li:tag:pii")
        );
    }
}
