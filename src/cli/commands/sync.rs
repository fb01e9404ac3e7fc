//! Sync command implementation
//!
//! Reconciles the local catalog against a DataHub snapshot: a JSON object
//! keyed by entity type (`tag`, `domain`, ...) whose values are arrays of
//! GraphQL search results.

use super::{load_catalog, save_catalog};
use crate::catalog::EntityTable;
use crate::cli::error::CliError;
use crate::cli::output::{OutputFormat, format_sync_summary, print_json};
use crate::config::AppConfig;
use crate::models::ConnectionId;
use crate::sync::{
    InMemorySource, RemoteRecord, SyncReport, SyncService, SyncSummary, pull_remote_only,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct SyncArgs {
    pub snapshot: PathBuf,
    /// Overrides `current_connection`
    pub connection: Option<String>,
    /// Write the proposed status changes back to the catalog
    pub apply: bool,
    /// Import remote-only entities as local rows (implies a catalog write)
    pub pull: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TableResult {
    entity_type: &'static str,
    #[serde(flatten)]
    summary: SyncSummary,
    applied: usize,
    pulled: usize,
}

fn settle<R>(
    table: &mut EntityTable<R::Local>,
    report: &SyncReport<R>,
    args: &SyncArgs,
    connection: Option<&ConnectionId>,
) -> Result<TableResult, CliError>
where
    R: RemoteRecord,
    R::Local: Clone,
{
    let applied = if args.apply {
        table.apply_status_updates(&report.status_updates)
    } else {
        0
    };

    let mut pulled = 0;
    if args.pull {
        for row in pull_remote_only(report, connection) {
            table.upsert_pulled(row)?;
            pulled += 1;
        }
    }

    Ok(TableResult {
        entity_type: R::ENTITY_TYPE.as_str(),
        summary: report.summary(),
        applied,
        pulled,
    })
}

pub async fn handle_sync(
    config: &AppConfig,
    args: &SyncArgs,
    format: OutputFormat,
) -> Result<(), CliError> {
    let text = std::fs::read_to_string(&args.snapshot)
        .map_err(|e| CliError::FileReadError(args.snapshot.clone(), e.to_string()))?;
    let snapshot: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| CliError::FileReadError(args.snapshot.clone(), e.to_string()))?;
    let source = InMemorySource::from_snapshot(&snapshot)?;

    let connection = args
        .connection
        .clone()
        .map(ConnectionId::new)
        .or_else(|| config.current_connection.clone());

    let service = SyncService::new(source, config.datahub.environment.clone())
        .with_connection(connection.clone())
        .with_mutation(config.datahub.mutation.clone());

    let mut catalog = load_catalog(&config.output.catalog_dir).await?;

    let tags = service.sync_tags(catalog.tags.rows()).await?;
    let domains = service.sync_domains(catalog.domains.rows()).await?;
    let nodes = service
        .sync_glossary_nodes(catalog.glossary_nodes.rows())
        .await?;
    let terms = service
        .sync_glossary_terms(catalog.glossary_terms.rows(), catalog.glossary_nodes.rows())
        .await?;
    let properties = service
        .sync_structured_properties(catalog.structured_properties.rows())
        .await?;
    let assertions = service.sync_assertions(catalog.assertions.rows()).await?;

    let conn = connection.as_ref();
    let results = vec![
        settle(&mut catalog.tags, &tags, args, conn)?,
        settle(&mut catalog.domains, &domains, args, conn)?,
        settle(&mut catalog.glossary_nodes, &nodes, args, conn)?,
        settle(&mut catalog.glossary_terms, &terms, args, conn)?,
        settle(&mut catalog.structured_properties, &properties, args, conn)?,
        settle(&mut catalog.assertions, &assertions, args, conn)?,
    ];

    if args.apply || args.pull {
        save_catalog(&config.output.catalog_dir, &catalog).await?;
        info!(
            "Saved catalog to {}",
            config.output.catalog_dir.display()
        );
    }

    match format {
        OutputFormat::Json => print_json(&results),
        OutputFormat::Text => {
            if let Some(connection) = &connection {
                println!("Connection: {}\n", connection);
            }
            for result in &results {
                print!("{}", format_sync_summary(result.entity_type, &result.summary));
            }
            let applied: usize = results.iter().map(|r| r.applied).sum();
            let pulled: usize = results.iter().map(|r| r.pulled).sum();
            if args.apply || args.pull {
                println!("\n✅ Applied {} status change(s), pulled {} row(s)", applied, pulled);
            }
            Ok(())
        }
    }
}
