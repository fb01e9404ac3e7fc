//! MCP generation and writer tests

use datahub_metadata_sdk::mcp::{BuildContext, McpBuilder, McpError, McpWriter};
use datahub_metadata_sdk::models::{ConnectionId, Domain, EntityMeta, Tag};
use datahub_metadata_sdk::storage::StorageBackend;
use datahub_metadata_sdk::storage::filesystem::FileSystemStorageBackend;
use datahub_metadata_sdk::storage::memory::MemoryStorageBackend;
use datahub_metadata_sdk::{Catalog, EntityType, Urn};
use std::collections::HashSet;
use serde_json::json;
use tempfile::TempDir;

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(f)
}

mod save_mcp_tests {
    use super::*;

    #[test]
    fn test_second_save_is_skipped_and_file_untouched() {
        let dir = TempDir::new().unwrap();
        let writer = McpWriter::new(FileSystemStorageBackend::new(dir.path()), "");
        let mcp = json!({"aspectName": "status", "aspect": {"removed": false}});

        assert!(block_on(writer.save_mcp_to_file(&mcp, "foo.json")).unwrap());
        let path = dir.path().join("foo.json");
        let first = std::fs::read(&path).unwrap();
        let modified = std::fs::metadata(&path).unwrap().modified().unwrap();

        assert!(!block_on(writer.save_mcp_to_file(&mcp, "foo.json")).unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), first);
        assert_eq!(
            std::fs::metadata(&path).unwrap().modified().unwrap(),
            modified
        );
    }

    #[test]
    fn test_timestamp_only_change_is_skipped() {
        let storage = MemoryStorageBackend::new();
        let writer = McpWriter::new(&storage, "mcps");
        let old = json!({
            "aspectName": "domainProperties",
            "aspect": {"name": "Finance", "created": {"time": 1000, "actor": "urn:li:corpuser:datahub"}}
        });
        let new = json!({
            "aspectName": "domainProperties",
            "aspect": {"created": {"actor": "urn:li:corpuser:datahub", "time": 2000}, "name": "Finance"}
        });

        assert!(block_on(writer.save_mcp_to_file(&old, "domain.json")).unwrap());
        assert!(!block_on(writer.save_mcp_to_file(&new, "domain.json")).unwrap());

        let stored: serde_json::Value =
            serde_json::from_slice(&block_on(storage.read_file("mcps/domain.json")).unwrap())
                .unwrap();
        assert_eq!(stored["aspect"]["created"]["time"], 1000);
    }

    #[test]
    fn test_content_change_is_written() {
        let storage = MemoryStorageBackend::new();
        let writer = McpWriter::new(&storage, "");
        let before = json!({"aspectName": "status", "aspect": {"removed": false}});
        let after = json!({"aspectName": "status", "aspect": {"removed": true}});

        assert!(block_on(writer.save_mcp_to_file(&before, "status.json")).unwrap());
        assert!(block_on(writer.save_mcp_to_file(&after, "status.json")).unwrap());

        let stored: serde_json::Value =
            serde_json::from_slice(&block_on(storage.read_file("status.json")).unwrap()).unwrap();
        assert_eq!(stored["aspect"]["removed"], true);
    }

    #[test]
    fn test_corrupt_existing_file_is_overwritten() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        let writer = McpWriter::new(FileSystemStorageBackend::new(dir.path()), "");
        let mcp = json!({"aspectName": "status", "aspect": {"removed": false}});

        assert!(block_on(writer.save_mcp_to_file(&mcp, "bad.json")).unwrap());
        let text = std::fs::read_to_string(dir.path().join("bad.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, mcp);
    }
}

mod write_all_tests {
    use super::*;

    fn sample_catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog
            .tags
            .create_local(Tag::new("PII").with_color("#ff0000"))
            .unwrap();
        catalog.domains.create_local(Domain::new("Finance")).unwrap();
        catalog
            .domains
            .create_local(Domain::new("Payments").with_parent("Finance"))
            .unwrap();
        catalog
    }

    #[test]
    fn test_regeneration_with_new_clock_changes_nothing() {
        let storage = MemoryStorageBackend::new();
        let catalog = sample_catalog();

        let first = McpBuilder::new(BuildContext::new("PROD").at(1_000))
            .catalog(&catalog)
            .unwrap();
        let writer = McpWriter::new(&storage, "metadata");
        let report = block_on(writer.write_all(&first)).unwrap();
        assert!(!report.created.is_empty());
        assert!(report.unchanged.is_empty());
        assert!(
            report
                .created
                .iter()
                .any(|p| p.starts_with("domain/") && p.ends_with("/domainProperties.json"))
        );

        let second = McpBuilder::new(BuildContext::new("PROD").at(9_999))
            .catalog(&catalog)
            .unwrap();
        let report = block_on(writer.write_all(&second)).unwrap();
        assert!(report.created.is_empty());
        assert_eq!(report.unchanged.len(), storage.len());
    }

    #[test]
    fn test_environment_changes_urns() {
        let catalog = sample_catalog();
        let prod = McpBuilder::new(BuildContext::new("PROD")).catalog(&catalog).unwrap();
        let dev = McpBuilder::new(BuildContext::new("DEV")).catalog(&catalog).unwrap();
        assert_eq!(prod.len(), dev.len());
        assert_ne!(prod[0].urn, dev[0].urn);

        let mutated = McpBuilder::new(BuildContext::new("PROD").with_mutation("eu"))
            .catalog(&catalog)
            .unwrap();
        assert_ne!(prod[0].urn, mutated[0].urn);
    }

    #[test]
    fn test_child_domain_points_at_parent_urn() {
        let catalog = sample_catalog();
        let entities = McpBuilder::new(BuildContext::new("PROD"))
            .catalog(&catalog)
            .unwrap();
        let domains: Vec<_> = entities
            .iter()
            .filter(|e| e.entity_type == EntityType::Domain)
            .collect();
        assert_eq!(domains.len(), 2);

        let parent_urn = domains[0].urn.to_string();
        let child_properties = domains[1]
            .mcps
            .iter()
            .find(|m| m.aspect_name == "domainProperties")
            .unwrap();
        assert_eq!(child_properties.aspect["parentDomain"], parent_urn.as_str());
    }

    #[test]
    fn test_consolidated_file_ignores_clock() {
        let dir = TempDir::new().unwrap();
        let catalog = sample_catalog();
        let writer = McpWriter::new(FileSystemStorageBackend::new(dir.path()), "out");

        let ctx = BuildContext::new("PROD").at(1);
        let entities = McpBuilder::new(ctx.clone()).catalog(&catalog).unwrap();
        let report = block_on(writer.write_consolidated("all.json", &entities, &ctx)).unwrap();
        assert_eq!(report.created, vec!["all.json".to_string()]);

        let text = std::fs::read_to_string(dir.path().join("out/all.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["metadata"]["entityCount"], 3);
        assert_eq!(value["metadata"]["environment"], "PROD");

        let later = BuildContext::new("PROD").at(2);
        let entities = McpBuilder::new(later.clone()).catalog(&catalog).unwrap();
        let report = block_on(writer.write_consolidated("all.json", &entities, &later)).unwrap();
        assert_eq!(report.unchanged, vec!["all.json".to_string()]);
    }
}

mod output_layout_tests {
    use super::*;

    fn builder() -> McpBuilder {
        McpBuilder::new(BuildContext::new("PROD").at(1_000))
    }

    fn pulled_tag(description: &str, connection: &str) -> Tag {
        let mut tag = Tag::new("PII").with_description(description);
        tag.meta = EntityMeta::pulled(
            Urn::new(EntityType::Tag, "pii"),
            Some(ConnectionId::new(connection)),
        );
        tag
    }

    #[test]
    fn test_names_that_sanitize_alike_get_separate_directories() {
        let storage = MemoryStorageBackend::new();
        let writer = McpWriter::new(&storage, "");
        let spaced = builder().tag(&Tag::new("a b")).unwrap();
        let underscored = builder().tag(&Tag::new("a_b")).unwrap();
        assert_ne!(spaced.urn, underscored.urn);
        assert_ne!(spaced.file_stem, underscored.file_stem);

        let report = block_on(writer.write_all(&[spaced, underscored])).unwrap();
        let distinct: HashSet<&String> = report.created.iter().collect();
        assert_eq!(report.created.len(), 4);
        assert_eq!(distinct.len(), 4);
        assert_eq!(storage.len(), 4);
    }

    #[test]
    fn test_dot_names_stay_below_output_root() {
        let dir = TempDir::new().unwrap();
        let writer = McpWriter::new(FileSystemStorageBackend::new(dir.path()), "mcps");
        let entities = vec![
            builder().tag(&Tag::new("..")).unwrap(),
            builder().tag(&Tag::new(".")).unwrap(),
        ];
        let report = block_on(writer.write_all(&entities)).unwrap();
        assert_eq!(report.created.len(), 4);
        for path in &report.created {
            assert!(dir.path().join("mcps").join(path).is_file(), "{path}");
        }

        let mut pulled = Tag::new("dots");
        pulled.meta = EntityMeta::pulled(Urn::new(EntityType::Tag, ".."), None);
        let built = builder().tag(&pulled).unwrap();
        assert_eq!(built.file_stem, "_..");
        assert!(block_on(writer.write_all(&[built])).is_ok());
    }

    #[test]
    fn test_shared_stem_for_different_urns_writes_nothing() {
        let storage = MemoryStorageBackend::new();
        let writer = McpWriter::new(&storage, "");
        let first = builder().tag(&Tag::new("PII")).unwrap();
        let mut second = builder().tag(&Tag::new("PHI")).unwrap();
        second.file_stem = first.file_stem.clone();

        let result = block_on(writer.write_all(&[first, second]));
        assert!(matches!(result, Err(McpError::PathCollision { .. })));
        assert!(storage.is_empty());
    }

    #[test]
    fn test_report_matches_files_on_disk() {
        let storage = MemoryStorageBackend::new();
        let writer = McpWriter::new(&storage, "out");
        let mut catalog = Catalog::new();
        for name in ["PII", "P I I", "P/I/I", "pii?"] {
            catalog.tags.create_local(Tag::new(name)).unwrap();
        }
        catalog.domains.create_local(Domain::new("Finance")).unwrap();
        catalog
            .domains
            .create_local(Domain::new("Finance Ops").with_parent("Finance"))
            .unwrap();

        let entities = builder().catalog(&catalog).unwrap();
        assert_eq!(entities.len(), 6);
        let report = block_on(writer.write_all(&entities)).unwrap();
        let expected: usize = entities.iter().map(|e| e.mcps.len()).sum();
        assert_eq!(report.total(), expected);
        assert_eq!(storage.len(), expected);
    }

    #[test]
    fn test_one_copy_per_datahub_id_for_current_connection() {
        let mut catalog = Catalog::new();
        catalog.tags.upsert_pulled(pulled_tag("from dev", "dev")).unwrap();
        catalog.tags.upsert_pulled(pulled_tag("from prod", "prod")).unwrap();
        assert_eq!(catalog.tags.len(), 2);

        let ctx = BuildContext::new("PROD").with_connection(Some(ConnectionId::new("prod")));
        let entities = McpBuilder::new(ctx).catalog(&catalog).unwrap();
        assert_eq!(entities.len(), 1);
        let properties = &entities[0].mcps[0];
        assert_eq!(properties.aspect["description"], "from prod");

        let ctx = BuildContext::new("PROD").with_connection(Some(ConnectionId::new("dev")));
        let entities = McpBuilder::new(ctx).catalog(&catalog).unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].mcps[0].aspect["description"], "from dev");
    }
}
