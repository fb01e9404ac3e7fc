//! Connection filtering and reconciliation tests

use datahub_metadata_sdk::catalog::EntityTable;
use datahub_metadata_sdk::models::{
    ConnectionId, Domain, EntityMeta, StructuredProperty, SyncStatus, Tag, ValueType,
};
use datahub_metadata_sdk::sync::{
    InMemorySource, MatchKind, SyncService, filter_by_connection, filter_domains_by_connection,
    pull_remote_only,
};
use datahub_metadata_sdk::urn::{EntityType, Urn, deterministic_urn};
use serde_json::json;

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(f)
}

fn pulled_tag(name: &str, id: &str, connection: Option<&str>) -> Tag {
    let mut tag = Tag::new(name);
    tag.meta = EntityMeta::pulled(
        Urn::new(EntityType::Tag, id),
        connection.map(ConnectionId::new),
    );
    tag
}

mod filter_tests {
    use super::*;

    #[test]
    fn test_current_connection_row_replaces_unbound_row() {
        let rows = vec![
            pulled_tag("PII", "abc", None),
            pulled_tag("PII", "abc", Some("current")),
        ];
        let current = ConnectionId::new("current");
        let selected = filter_by_connection(&rows, Some(&current));
        assert_eq!(selected.len(), 1);
        assert_eq!(
            selected[0].meta.connection.as_ref(),
            Some(&current)
        );
    }

    #[test]
    fn test_one_row_per_datahub_id_in_first_seen_order() {
        let rows = vec![
            pulled_tag("B", "b", Some("other")),
            pulled_tag("A", "a", None),
            pulled_tag("B", "b", None),
            pulled_tag("A", "a", Some("prod")),
            Tag::new("Local"),
        ];
        let prod = ConnectionId::new("prod");
        let selected = filter_by_connection(&rows, Some(&prod));
        let names: Vec<(&str, Option<&str>)> = selected
            .iter()
            .map(|t| (t.name.as_str(), t.meta.connection.as_ref().map(|c| c.as_str())))
            .collect();
        assert_eq!(
            names,
            vec![("B", Some("other")), ("A", Some("prod")), ("Local", None)]
        );
    }

    #[test]
    fn test_domains_follow_same_rule() {
        let mut unbound = Domain::new("Finance");
        unbound.meta = EntityMeta::pulled(Urn::new(EntityType::Domain, "fin"), None);
        let mut bound = Domain::new("Finance");
        bound.meta = EntityMeta::pulled(
            Urn::new(EntityType::Domain, "fin"),
            Some(ConnectionId::new("prod")),
        );
        let rows = vec![unbound, bound];

        let selected = filter_domains_by_connection(&rows, Some(&ConnectionId::new("prod")));
        assert_eq!(selected.len(), 1);
        assert!(selected[0].meta.connection.is_some());

        let selected = filter_domains_by_connection(&rows, None);
        assert_eq!(selected.len(), 1);
        assert!(selected[0].meta.connection.is_some());
    }
}

mod reconcile_tests {
    use super::*;

    #[test]
    fn test_buckets_and_status_updates() {
        let tags = vec![
            pulled_tag("PII", "pii", None),
            pulled_tag("Gold", "gold", None).with_description("top tier"),
            Tag::new("Draft"),
        ];
        let source = InMemorySource::new().with_entities(
            EntityType::Tag,
            vec![
                json!({"urn": "urn:li:tag:pii", "properties": {"name": "PII"}}),
                json!({"urn": "urn:li:tag:gold", "properties": {"name": "Gold", "description": "best"}}),
                json!({"urn": "urn:li:tag:new", "properties": {"name": "New"}}),
            ],
        );
        let service = SyncService::new(source, "PROD").with_page_size(2);
        let report = block_on(service.sync_tags(&tags)).unwrap();

        let summary = report.summary();
        assert_eq!(
            (summary.synced, summary.modified, summary.local_only, summary.remote_only),
            (1, 1, 1, 1)
        );
        assert_eq!(report.modified[0].local_index, 1);
        assert_eq!(report.modified[0].diffs[0].field, "description");
        assert_eq!(report.local_only[0].local_name, "Draft");
        assert_eq!(report.remote_only[0].urn.as_str(), "urn:li:tag:new");

        let mut table = EntityTable::from_rows(tags).unwrap();
        table.apply_status_updates(&report.status_updates);
        assert_eq!(table.rows()[0].meta.sync_status, SyncStatus::Synced);
        assert_eq!(table.rows()[1].meta.sync_status, SyncStatus::Modified);
        assert_eq!(table.rows()[2].meta.sync_status, SyncStatus::LocalOnly);
    }

    #[test]
    fn test_reconcile_does_not_touch_rows() {
        let tags = vec![pulled_tag("PII", "pii", None).with_description("changed")];
        let source = InMemorySource::new().with_entities(
            EntityType::Tag,
            vec![json!({"urn": "urn:li:tag:pii", "properties": {"name": "PII"}})],
        );
        let report = block_on(SyncService::new(source, "PROD").sync_tags(&tags)).unwrap();
        assert_eq!(report.modified.len(), 1);
        assert_eq!(tags[0].meta.sync_status, SyncStatus::Synced);
    }

    #[test]
    fn test_name_fallback_adopts_remote_urn() {
        let tags = vec![Tag::new("Sensitive")];
        let source = InMemorySource::new().with_entities(
            EntityType::Tag,
            vec![json!({"urn": "urn:li:tag:sensitive", "properties": {"name": "sensitive"}})],
        );
        let report = block_on(SyncService::new(source, "PROD").sync_tags(&tags)).unwrap();
        let pair = report
            .synced
            .first()
            .or_else(|| report.modified.first())
            .unwrap();
        assert_eq!(pair.matched_by, MatchKind::Name);

        let mut table = EntityTable::from_rows(tags).unwrap();
        table.apply_status_updates(&report.status_updates);
        assert_eq!(
            table.rows()[0].meta.urn.as_ref().map(Urn::as_str),
            Some("urn:li:tag:sensitive")
        );
    }

    #[test]
    fn test_name_fallback_skips_remote_already_matched_by_urn() {
        let tags = vec![pulled_tag("PII", "pii", None), Tag::new("PII")];
        let source = InMemorySource::new().with_entities(
            EntityType::Tag,
            vec![
                json!({"urn": "urn:li:tag:pii", "properties": {"name": "PII"}}),
                json!({"urn": "urn:li:tag:pii2", "properties": {"name": "PII"}}),
            ],
        );
        let report = block_on(SyncService::new(source, "PROD").sync_tags(&tags)).unwrap();

        let summary = report.summary();
        assert_eq!(
            (summary.synced, summary.local_only, summary.remote_only),
            (2, 0, 0)
        );
        let by_name = report
            .synced
            .iter()
            .find(|pair| pair.matched_by == MatchKind::Name)
            .unwrap();
        assert_eq!(by_name.local_index, 1);

        let mut table = EntityTable::from_rows(tags).unwrap();
        table.apply_status_updates(&report.status_updates);
        assert_eq!(
            table.rows()[1].meta.urn.as_ref().map(Urn::as_str),
            Some("urn:li:tag:pii2")
        );
    }

    #[test]
    fn test_pull_remote_only_binds_connection() {
        let source = InMemorySource::new().with_entities(
            EntityType::Tag,
            vec![json!({"urn": "urn:li:tag:new", "properties": {"name": "New", "colorHex": "#00FF00"}})],
        );
        let prod = ConnectionId::new("prod");
        let service = SyncService::new(source, "PROD").with_connection(Some(prod.clone()));
        let report = block_on(service.sync_tags(&[])).unwrap();

        let rows = pull_remote_only(&report, service.connection());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "New");
        assert_eq!(rows[0].meta.connection, Some(prod));
        assert_eq!(rows[0].meta.sync_status, SyncStatus::Synced);

        let mut table = EntityTable::new();
        for row in rows {
            table.upsert_pulled(row).unwrap();
        }
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_structured_property_matched_by_deterministic_urn() {
        let property = StructuredProperty::new("io.acryl.retention", ValueType::Number);
        let urn = deterministic_urn(
            EntityType::StructuredProperty,
            "io.acryl.retention",
            "PROD",
            None,
        );
        let mut synced = property.clone();
        synced.meta = EntityMeta::pulled(urn.clone(), None);

        let source = InMemorySource::new().with_entities(
            EntityType::StructuredProperty,
            vec![json!({
                "urn": urn.as_str(),
                "definition": {
                    "qualifiedName": "io.acryl.retention",
                    "valueType": {"urn": "urn:li:dataType:datahub.number"},
                    "cardinality": "SINGLE",
                    "entityTypes": [{"urn": "urn:li:entityType:datahub.dataset"}],
                    "immutable": false
                }
            })],
        );
        let report = block_on(
            SyncService::new(source, "PROD").sync_structured_properties(&[synced]),
        )
        .unwrap();
        assert_eq!(report.synced.len(), 1, "{:?}", report.modified);
        assert_eq!(report.synced[0].matched_by, MatchKind::Urn);
    }
}
