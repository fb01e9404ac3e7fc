//! datahub-mm
//!
//! Command-line interface for managing DataHub metadata locally: generating
//! MCP files, validating the catalog, reconciling it against DataHub and
//! staging changes onto a Git review branch.

use clap::{Parser, Subcommand};
use datahub_metadata_sdk::cli::CliError;
use datahub_metadata_sdk::cli::commands::filter::handle_filter;
use datahub_metadata_sdk::cli::commands::generate::{GenerateArgs, handle_generate};
use datahub_metadata_sdk::cli::commands::sync::{SyncArgs, handle_sync};
use datahub_metadata_sdk::cli::commands::urn::handle_urn;
use datahub_metadata_sdk::cli::commands::validate::handle_validate;
use datahub_metadata_sdk::cli::output::{OutputFormat, print_json_error};
use datahub_metadata_sdk::config::AppConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "datahub-mm")]
#[command(version, about = "DataHub metadata manager", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the deterministic URN for an entity id
    Urn {
        /// Entity type, e.g. tag, domain, glossaryTerm
        entity_type: String,

        /// Entity id (usually its name)
        id: String,
    },

    /// Generate MCP files for the local catalog
    Generate {
        /// Output directory (defaults to output.mcp_dir)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Write a single consolidated file
        #[arg(long)]
        consolidated: bool,

        /// Generate even when the catalog has validation errors
        #[arg(long)]
        skip_validation: bool,
    },

    /// Validate the local catalog
    Validate,

    /// List the rows selected for a connection
    Filter {
        /// Entity type, e.g. tag, domain, glossaryTerm
        entity_type: String,

        /// Connection id (defaults to current_connection)
        #[arg(long)]
        connection: Option<String>,
    },

    /// Reconcile the local catalog against a DataHub snapshot
    Sync {
        /// JSON snapshot of DataHub search results keyed by entity type
        snapshot: PathBuf,

        /// Connection id (defaults to current_connection)
        #[arg(long)]
        connection: Option<String>,

        /// Write the resulting sync statuses back to the catalog
        #[arg(long)]
        apply: bool,

        /// Import remote-only entities into the catalog
        #[arg(long)]
        pull: bool,
    },

    /// Commit one entity's MCPs to the review branch
    #[cfg(feature = "git")]
    Stage {
        /// Entity type, e.g. tag, domain, glossaryTerm
        entity_type: String,

        /// Entity name
        name: String,

        /// Directory inside the repository (defaults to output.mcp_dir)
        #[arg(long)]
        dir: Option<String>,

        /// Commit message
        #[arg(short, long)]
        message: Option<String>,
    },
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let format = cli.format;

    match cli.command {
        Commands::Urn { entity_type, id } => handle_urn(&config, &entity_type, &id, format),
        Commands::Generate {
            out,
            consolidated,
            skip_validation,
        } => {
            let args = GenerateArgs {
                out,
                consolidated,
                skip_validation,
            };
            handle_generate(&config, &args, format).await
        }
        Commands::Validate => handle_validate(&config, format).await,
        Commands::Filter {
            entity_type,
            connection,
        } => handle_filter(&config, &entity_type, connection, format).await,
        Commands::Sync {
            snapshot,
            connection,
            apply,
            pull,
        } => {
            let args = SyncArgs {
                snapshot,
                connection,
                apply,
                pull,
            };
            handle_sync(&config, &args, format).await
        }
        #[cfg(feature = "git")]
        Commands::Stage {
            entity_type,
            name,
            dir,
            message,
        } => {
            use datahub_metadata_sdk::cli::commands::stage::{StageArgs, handle_stage};
            let args = StageArgs {
                entity_type,
                name,
                dir,
                message,
            };
            handle_stage(&config, &args, format).await
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = cli.format;

    if let Err(e) = run(cli).await {
        match format {
            OutputFormat::Json => print_json_error(&e.to_string()),
            OutputFormat::Text => eprintln!("Error: {}", e),
        }
        std::process::exit(1);
    }
}
