//! Filter command implementation

use super::{load_catalog, parse_managed_type};
use crate::catalog::{Catalog, EntityTable};
use crate::cli::error::CliError;
use crate::cli::output::{OutputFormat, print_json};
use crate::config::AppConfig;
use crate::models::{ConnectionId, Entity};
use crate::sync::filter_indices_by_connection;
use crate::urn::EntityType;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FilteredRow {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    datahub_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    connection: Option<String>,
    sync_status: String,
}

fn selected<E: Entity + Clone>(
    table: &EntityTable<E>,
    current: Option<&ConnectionId>,
) -> Vec<FilteredRow> {
    let rows = table.rows();
    filter_indices_by_connection(rows, current)
        .into_iter()
        .map(|idx| {
            let meta = rows[idx].meta();
            FilteredRow {
                name: rows[idx].name().to_string(),
                datahub_id: meta.effective_datahub_id().map(str::to_string),
                connection: meta.connection.as_ref().map(|c| c.to_string()),
                sync_status: meta.sync_status.to_string(),
            }
        })
        .collect()
}

fn rows_for(
    catalog: &Catalog,
    entity_type: EntityType,
    current: Option<&ConnectionId>,
) -> Vec<FilteredRow> {
    match entity_type {
        EntityType::Tag => selected(&catalog.tags, current),
        EntityType::Domain => selected(&catalog.domains, current),
        EntityType::GlossaryNode => selected(&catalog.glossary_nodes, current),
        EntityType::GlossaryTerm => selected(&catalog.glossary_terms, current),
        EntityType::StructuredProperty => selected(&catalog.structured_properties, current),
        EntityType::Assertion => selected(&catalog.assertions, current),
        EntityType::DataContract => selected(&catalog.data_contracts, current),
        EntityType::DataProduct => selected(&catalog.data_products, current),
        EntityType::Corpuser | EntityType::CorpGroup | EntityType::Dataset => Vec::new(),
    }
}

/// List the rows shown for the current connection: one per datahub_id
pub async fn handle_filter(
    config: &AppConfig,
    entity_type: &str,
    connection: Option<String>,
    format: OutputFormat,
) -> Result<(), CliError> {
    let entity_type = parse_managed_type(entity_type)?;
    let current = connection
        .map(ConnectionId::new)
        .or_else(|| config.current_connection.clone());
    let catalog = load_catalog(&config.output.catalog_dir).await?;
    let rows = rows_for(&catalog, entity_type, current.as_ref());

    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Text => {
            for row in &rows {
                println!(
                    "{:<32} {:<12} {:<14} {}",
                    row.name,
                    row.connection.as_deref().unwrap_or("-"),
                    row.sync_status,
                    row.datahub_id.as_deref().unwrap_or("-"),
                );
            }
            println!("\n{} {} row(s)", rows.len(), entity_type);
            Ok(())
        }
    }
}
