//! Generate command implementation

use super::{build_context, load_catalog};
use crate::cli::error::CliError;
use crate::cli::output::{OutputFormat, format_write_report, print_json};
use crate::config::AppConfig;
use crate::mcp::{McpBuilder, McpWriter};
use crate::storage::filesystem::FileSystemStorageBackend;
use crate::validation::validate_catalog;
use std::path::PathBuf;
use tracing::info;

pub const CONSOLIDATED_FILE: &str = "mcps.json";

#[derive(Debug, Clone, Default)]
pub struct GenerateArgs {
    /// Overrides `output.mcp_dir`
    pub out: Option<PathBuf>,
    /// Overrides `output.consolidated` when set
    pub consolidated: bool,
    pub skip_validation: bool,
}

/// Build MCPs for the whole catalog and write the ones whose content changed
pub async fn handle_generate(
    config: &AppConfig,
    args: &GenerateArgs,
    format: OutputFormat,
) -> Result<(), CliError> {
    let catalog = load_catalog(&config.output.catalog_dir).await?;

    if !args.skip_validation {
        let errors = validate_catalog(&catalog);
        if let Some(first) = errors.first() {
            return Err(CliError::ValidationError(format!(
                "{} error(s), first: {}",
                errors.len(),
                first
            )));
        }
    }

    let builder = McpBuilder::new(build_context(config));
    let entities = builder.catalog(&catalog)?;
    info!("Generated MCPs for {} entities", entities.len());

    let out_dir = args.out.clone().unwrap_or_else(|| config.output.mcp_dir.clone());
    let writer = McpWriter::new(FileSystemStorageBackend::new(&out_dir), "");
    let report = if args.consolidated || config.output.consolidated {
        writer
            .write_consolidated(CONSOLIDATED_FILE, &entities, builder.context())
            .await?
    } else {
        writer.write_all(&entities).await?
    };

    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => {
            println!("Output directory: {}", out_dir.display());
            print!("{}", format_write_report(&report));
            Ok(())
        }
    }
}
