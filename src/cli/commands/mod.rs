//! CLI command implementations

pub mod filter;
pub mod generate;
#[cfg(feature = "git")]
pub mod stage;
pub mod sync;
pub mod urn;
pub mod validate;

use crate::catalog::{Catalog, CatalogLoader, CatalogSaver};
use crate::cli::error::CliError;
use crate::config::AppConfig;
use crate::mcp::BuildContext;
use crate::storage::filesystem::FileSystemStorageBackend;
use crate::urn::EntityType;
use std::path::Path;

/// Load the catalog stored in `dir`
pub(crate) async fn load_catalog(dir: &Path) -> Result<Catalog, CliError> {
    let loader = CatalogLoader::new(FileSystemStorageBackend::new(dir));
    Ok(loader.load("").await?)
}

pub(crate) async fn save_catalog(dir: &Path, catalog: &Catalog) -> Result<(), CliError> {
    let saver = CatalogSaver::new(FileSystemStorageBackend::new(dir));
    Ok(saver.save("", catalog).await?)
}

/// Build context for the configured environment and mutation
pub(crate) fn build_context(config: &AppConfig) -> BuildContext {
    let ctx = BuildContext::new(config.datahub.environment.clone())
        .with_actor(config.datahub.actor.clone())
        .with_connection(config.current_connection.clone());
    match &config.datahub.mutation {
        Some(mutation) => ctx.with_mutation(mutation.clone()),
        None => ctx,
    }
}

/// Parse an entity type the manager keeps locally
pub(crate) fn parse_managed_type(value: &str) -> Result<EntityType, CliError> {
    let entity_type: EntityType = value
        .trim()
        .parse()
        .map_err(|e| CliError::InvalidArgument(format!("{}", e)))?;
    if !EntityType::managed().contains(&entity_type) {
        return Err(CliError::InvalidArgument(format!(
            "'{}' is not managed locally",
            entity_type
        )));
    }
    Ok(entity_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConnectionId;
    use tempfile::TempDir;

    #[test]
    fn test_parse_managed_type() {
        assert_eq!(parse_managed_type(" tag ").unwrap(), EntityType::Tag);
        assert_eq!(
            parse_managed_type("glossaryTerm").unwrap(),
            EntityType::GlossaryTerm
        );
        assert!(parse_managed_type("dataset").is_err());
        assert!(parse_managed_type("table").is_err());
    }

    #[test]
    fn test_build_context_uses_config() {
        let mut config = AppConfig::default();
        config.datahub.environment = "DEV".to_string();
        config.datahub.mutation = Some("eu".to_string());
        config.current_connection = Some(ConnectionId::new("dev"));
        let ctx = build_context(&config);
        assert_eq!(ctx.environment, "DEV");
        assert_eq!(ctx.mutation.as_deref(), Some("eu"));
        assert_eq!(ctx.connection, Some(ConnectionId::new("dev")));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_catalog_round_trip_through_directory() {
        let dir = TempDir::new().unwrap();
        let mut catalog = Catalog::new();
        catalog
            .tags
            .create_local(crate::models::Tag::new("PII"))
            .unwrap();

        save_catalog(dir.path(), &catalog).await.unwrap();
        assert!(dir.path().join("tags.yaml").exists());

        let loaded = load_catalog(dir.path()).await.unwrap();
        assert_eq!(loaded.tags.len(), 1);
        assert_eq!(loaded.tags.rows()[0].name, "PII");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_missing_catalog_dir_loads_empty() {
        let dir = TempDir::new().unwrap();
        let loaded = load_catalog(&dir.path().join("absent")).await.unwrap();
        assert!(loaded.is_empty());
    }
}
