//! Urn command implementation

use super::parse_managed_type;
use crate::cli::error::CliError;
use crate::cli::output::{OutputFormat, print_json};
use crate::config::AppConfig;
use crate::urn::deterministic_urn;
use serde_json::json;

/// Print the deterministic URN of `id` in the configured environment
pub fn handle_urn(
    config: &AppConfig,
    entity_type: &str,
    id: &str,
    format: OutputFormat,
) -> Result<(), CliError> {
    if id.trim().is_empty() {
        return Err(CliError::InvalidArgument("id must not be empty".to_string()));
    }
    let entity_type = parse_managed_type(entity_type)?;
    let urn = deterministic_urn(
        entity_type,
        id,
        &config.datahub.environment,
        config.datahub.mutation.as_deref(),
    );

    match format {
        OutputFormat::Json => print_json(json!({
            "entityType": entity_type,
            "id": id.trim(),
            "environment": config.datahub.environment,
            "mutation": config.datahub.mutation,
            "urn": urn,
        })),
        OutputFormat::Text => {
            println!("{}", urn);
            Ok(())
        }
    }
}
