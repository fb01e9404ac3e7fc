//! Output formatting for CLI

use crate::cli::error::CliError;
use crate::mcp::WriteReport;
use crate::response::ApiResponse;
use crate::sync::SyncSummary;
use crate::validation::ValidationError;
use clap::ValueEnum;
use serde::Serialize;

/// How command results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print `data` wrapped in a `{success, data}` envelope
pub fn print_json<T: Serialize>(data: T) -> Result<(), CliError> {
    let response = ApiResponse::ok(data);
    let text = serde_json::to_string_pretty(&response)
        .map_err(|e| CliError::InvalidArgument(format!("Failed to serialize output: {}", e)))?;
    println!("{}", text);
    Ok(())
}

/// Print a `{success: false, error}` envelope
pub fn print_json_error(message: &str) {
    let response = ApiResponse::<()>::err(message);
    match serde_json::to_string_pretty(&response) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{{\"success\":false}}"),
    }
}

pub fn format_write_report(report: &WriteReport) -> String {
    let mut output = String::new();
    for path in &report.created {
        output.push_str(&format!("  + {}\n", path));
    }
    output.push_str(&format!(
        "\n✅ Wrote {} file(s), {} unchanged\n",
        report.created.len(),
        report.unchanged.len()
    ));
    output
}

pub fn format_sync_summary(label: &str, summary: &SyncSummary) -> String {
    format!(
        "{:<22} synced: {:>4}  modified: {:>4}  local only: {:>4}  remote only: {:>4}\n",
        label, summary.synced, summary.modified, summary.local_only, summary.remote_only
    )
}

pub fn format_validation_errors(errors: &[ValidationError]) -> String {
    if errors.is_empty() {
        return "✅ All checks passed!\n".to_string();
    }
    let mut output = format!("\n⚠️  {} validation error(s):\n", errors.len());
    for error in errors {
        output.push_str(&format!("  - {}\n", error));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_write_report() {
        let report = WriteReport {
            created: vec!["tag/pii/tagProperties.json".to_string()],
            unchanged: vec!["tag/pii/status.json".to_string()],
        };
        let text = format_write_report(&report);
        assert!(text.contains("+ tag/pii/tagProperties.json"));
        assert!(text.contains("Wrote 1 file(s), 1 unchanged"));
        assert!(!text.contains("status.json"));
    }

    #[test]
    fn test_format_validation_errors() {
        assert!(format_validation_errors(&[]).contains("All checks passed"));
        let errors = vec![ValidationError::InvalidColor {
            tag: "PII".to_string(),
            color: "red".to_string(),
        }];
        let text = format_validation_errors(&errors);
        assert!(text.contains("1 validation error(s)"));
        assert!(text.contains("PII"));
    }
}
