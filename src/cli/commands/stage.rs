//! Stage command implementation

use super::{build_context, load_catalog, parse_managed_type, save_catalog};
use crate::catalog::EntityTable;
use crate::cli::error::CliError;
use crate::cli::output::{OutputFormat, print_json};
use crate::config::AppConfig;
use crate::git::{GitService, PushOutcome, StagedFile, stage_entity};
use crate::mcp::{BuildContext, EntityMcps, McpBuilder};
use crate::models::{ConnectionId, Entity};
use crate::sync::filter_indices_by_connection;
use crate::urn::EntityType;

#[derive(Debug, Clone, Default)]
pub struct StageArgs {
    pub entity_type: String,
    pub name: String,
    /// Directory inside the repository, defaults to `output.mcp_dir`
    pub dir: Option<String>,
    pub message: Option<String>,
}

struct StageTarget<'a> {
    entities: &'a [EntityMcps],
    ctx: &'a BuildContext,
    current: Option<&'a ConnectionId>,
    dir: &'a str,
    message: &'a str,
}

fn stage_in<E: Entity + Clone>(
    service: &GitService,
    table: &mut EntityTable<E>,
    name: &str,
    target: &StageTarget<'_>,
) -> Result<PushOutcome, CliError> {
    let index = filter_indices_by_connection(table.rows(), target.current)
        .into_iter()
        .find(|&idx| table.rows()[idx].name().trim() == name.trim())
        .ok_or_else(|| {
            CliError::InvalidArgument(format!("No {} named '{}'", E::ENTITY_TYPE, name.trim()))
        })?;

    let urn = target.ctx.urn_for(&table.rows()[index]);
    let mcps = target
        .entities
        .iter()
        .find(|e| e.entity_type == E::ENTITY_TYPE && e.urn == urn)
        .ok_or_else(|| CliError::InvalidArgument(format!("No MCPs generated for {}", urn)))?;

    let file = StagedFile::from_entity_mcps(target.dir, mcps)?;
    Ok(stage_entity(service, table, index, &file, target.message)?)
}

/// Commit one entity's MCPs to the review branch and mark it `PENDING_PUSH`
pub async fn handle_stage(
    config: &AppConfig,
    args: &StageArgs,
    format: OutputFormat,
) -> Result<(), CliError> {
    let entity_type = parse_managed_type(&args.entity_type)?;
    let mut catalog = load_catalog(&config.output.catalog_dir).await?;

    let builder = McpBuilder::new(build_context(config));
    let entities = builder.catalog(&catalog)?;

    let service =
        GitService::from_settings(&config.git).map_err(|e| CliError::Git(format!("{:#}", e)))?;

    let dir = args
        .dir
        .clone()
        .unwrap_or_else(|| config.output.mcp_dir.to_string_lossy().into_owned());
    let message = args
        .message
        .clone()
        .unwrap_or_else(|| format!("Update {} {}", entity_type, args.name.trim()));
    let target = StageTarget {
        entities: &entities,
        ctx: builder.context(),
        current: config.current_connection.as_ref(),
        dir: &dir,
        message: &message,
    };

    let outcome = match entity_type {
        EntityType::Tag => stage_in(&service, &mut catalog.tags, &args.name, &target)?,
        EntityType::Domain => stage_in(&service, &mut catalog.domains, &args.name, &target)?,
        EntityType::GlossaryNode => {
            stage_in(&service, &mut catalog.glossary_nodes, &args.name, &target)?
        }
        EntityType::GlossaryTerm => {
            stage_in(&service, &mut catalog.glossary_terms, &args.name, &target)?
        }
        EntityType::StructuredProperty => stage_in(
            &service,
            &mut catalog.structured_properties,
            &args.name,
            &target,
        )?,
        EntityType::Assertion => {
            stage_in(&service, &mut catalog.assertions, &args.name, &target)?
        }
        EntityType::DataContract => {
            stage_in(&service, &mut catalog.data_contracts, &args.name, &target)?
        }
        EntityType::DataProduct => {
            stage_in(&service, &mut catalog.data_products, &args.name, &target)?
        }
        other => {
            return Err(CliError::InvalidArgument(format!(
                "'{}' is not managed locally",
                other
            )));
        }
    };

    if outcome.success {
        save_catalog(&config.output.catalog_dir, &catalog).await?;
    }

    match format {
        OutputFormat::Json => print_json(&outcome)?,
        OutputFormat::Text if outcome.success => {
            println!("✅ Staged on branch {}", service.branch());
        }
        OutputFormat::Text => {}
    }

    if outcome.success {
        Ok(())
    } else {
        Err(CliError::Git(
            outcome.error.unwrap_or_else(|| "push failed".to_string()),
        ))
    }
}
