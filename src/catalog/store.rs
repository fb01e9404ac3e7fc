//! Catalog persistence
//!
//! A catalog directory holds one YAML file per entity type, each a list of
//! rows:
//!
//! ```text
//! catalog/
//!   tags.yaml
//!   domains.yaml
//!   glossary_nodes.yaml
//!   glossary_terms.yaml
//!   structured_properties.yaml
//!   assertions.yaml
//!   data_contracts.yaml
//!   data_products.yaml
//! ```
//!
//! Missing files load as empty tables.

use super::{Catalog, CatalogError, EntityTable};
use crate::models::Entity;
use crate::storage::{StorageBackend, join_path};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

const TAGS_FILE: &str = "tags.yaml";
const DOMAINS_FILE: &str = "domains.yaml";
const GLOSSARY_NODES_FILE: &str = "glossary_nodes.yaml";
const GLOSSARY_TERMS_FILE: &str = "glossary_terms.yaml";
const PROPERTIES_FILE: &str = "structured_properties.yaml";
const ASSERTIONS_FILE: &str = "assertions.yaml";
const CONTRACTS_FILE: &str = "data_contracts.yaml";
const PRODUCTS_FILE: &str = "data_products.yaml";

/// Catalog loader that uses a storage backend
pub struct CatalogLoader<B: StorageBackend> {
    storage: B,
}

impl<B: StorageBackend> CatalogLoader<B> {
    pub fn new(storage: B) -> Self {
        Self { storage }
    }

    /// Load every table from `dir`
    pub async fn load(&self, dir: &str) -> Result<Catalog, CatalogError> {
        let catalog = Catalog {
            tags: self.load_table(dir, TAGS_FILE).await?,
            domains: self.load_table(dir, DOMAINS_FILE).await?,
            glossary_nodes: self.load_table(dir, GLOSSARY_NODES_FILE).await?,
            glossary_terms: self.load_table(dir, GLOSSARY_TERMS_FILE).await?,
            structured_properties: self.load_table(dir, PROPERTIES_FILE).await?,
            assertions: self.load_table(dir, ASSERTIONS_FILE).await?,
            data_contracts: self.load_table(dir, CONTRACTS_FILE).await?,
            data_products: self.load_table(dir, PRODUCTS_FILE).await?,
        };
        info!("Loaded {} catalog rows from {}", catalog.len(), dir);
        Ok(catalog)
    }

    async fn load_table<E>(&self, dir: &str, file: &str) -> Result<EntityTable<E>, CatalogError>
    where
        E: Entity + Clone + DeserializeOwned,
    {
        let path = join_path(dir, file);
        if !self.storage.file_exists(&path).await? {
            debug!("No {} in {}, starting empty", file, dir);
            return Ok(EntityTable::new());
        }

        let content = self.storage.read_file(&path).await?;
        let text = String::from_utf8(content).map_err(|e| CatalogError::Parse {
            path: path.clone(),
            message: format!("Invalid UTF-8: {}", e),
        })?;
        if text.trim().is_empty() {
            return Ok(EntityTable::new());
        }
        let rows: Vec<E> = serde_yaml::from_str(&text).map_err(|e| CatalogError::Parse {
            path: path.clone(),
            message: e.to_string(),
        })?;
        EntityTable::from_rows(rows)
    }
}

/// Catalog saver that uses a storage backend
pub struct CatalogSaver<B: StorageBackend> {
    storage: B,
}

impl<B: StorageBackend> CatalogSaver<B> {
    pub fn new(storage: B) -> Self {
        Self { storage }
    }

    /// Write every table to `dir`, creating it when needed
    pub async fn save(&self, dir: &str, catalog: &Catalog) -> Result<(), CatalogError> {
        if !self.storage.dir_exists(dir).await? {
            self.storage.create_dir(dir).await?;
        }

        self.save_table(dir, TAGS_FILE, &catalog.tags).await?;
        self.save_table(dir, DOMAINS_FILE, &catalog.domains).await?;
        self.save_table(dir, GLOSSARY_NODES_FILE, &catalog.glossary_nodes).await?;
        self.save_table(dir, GLOSSARY_TERMS_FILE, &catalog.glossary_terms).await?;
        self.save_table(dir, PROPERTIES_FILE, &catalog.structured_properties).await?;
        self.save_table(dir, ASSERTIONS_FILE, &catalog.assertions).await?;
        self.save_table(dir, CONTRACTS_FILE, &catalog.data_contracts).await?;
        self.save_table(dir, PRODUCTS_FILE, &catalog.data_products).await?;

        info!("Saved {} catalog rows to {}", catalog.len(), dir);
        Ok(())
    }

    async fn save_table<E: Serialize>(
        &self,
        dir: &str,
        file: &str,
        table: &EntityTable<E>,
    ) -> Result<(), CatalogError> {
        let path = join_path(dir, file);
        let yaml = serde_yaml::to_string(table).map_err(|e| CatalogError::Serialize {
            path: path.clone(),
            message: e.to_string(),
        })?;
        self.storage.write_file(&path, yaml.as_bytes()).await?;
        Ok(())
    }
}
