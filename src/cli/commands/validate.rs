//! Validate command implementation

use super::load_catalog;
use crate::cli::error::CliError;
use crate::cli::output::{OutputFormat, format_validation_errors, print_json};
use crate::config::AppConfig;
use crate::validation::validate_catalog;
use serde_json::json;

/// Validate the local catalog; any finding makes the command fail
pub async fn handle_validate(config: &AppConfig, format: OutputFormat) -> Result<(), CliError> {
    let catalog = load_catalog(&config.output.catalog_dir).await?;
    let errors = validate_catalog(&catalog);

    match format {
        OutputFormat::Json => {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            print_json(json!({ "entities": catalog.len(), "errors": messages }))?;
        }
        OutputFormat::Text => print!("{}", format_validation_errors(&errors)),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(CliError::ValidationError(format!(
            "{} error(s) in catalog",
            errors.len()
        )))
    }
}
