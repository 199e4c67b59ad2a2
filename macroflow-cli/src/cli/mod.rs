//! Command-line interface

pub mod commands;
pub mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::config::Config;
use crate::model::DocumentStatus;
use crate::store::{DocumentStore, MemoryStore, SqliteStore};

#[derive(Parser, Debug)]
#[command(
    name = "macroflow",
    version,
    about = "Import macro-process workbooks into the process store"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file (defaults to <config dir>/macroflow/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Document store connection string, e.g. sqlite://macroflow.db
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// Workbook to read
    #[arg(long, short, global = true)]
    pub workbook: Option<PathBuf>,

    /// Show debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import every sheet of the workbook as a macro with its processes
    Import(ImportArgs),

    /// Move every process document from one status to another
    UpdateStatus(UpdateStatusArgs),

    /// Clear macros, documents, job positions and departments, then import
    Repopulate(ImportArgs),

    /// Clear departments and job positions and rebuild them from the directions columns
    RebuildOrg,

    /// Show the sheets of the workbook and how their headers are detected
    Inspect(InspectArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ImportArgs {
    /// Run against an empty in-memory store; nothing is persisted
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct UpdateStatusArgs {
    /// Status to move documents out of
    #[arg(long, value_enum, default_value_t = DocumentStatus::Draft)]
    pub from: DocumentStatus,

    /// Status to move documents into
    #[arg(long, value_enum, default_value_t = DocumentStatus::Approved)]
    pub to: DocumentStatus,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// Rows printed per sheet
    #[arg(long, default_value_t = 5)]
    pub rows: usize,
}

impl GlobalArgs {
    /// Load the configuration and apply environment and flag overrides
    pub fn resolve_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        config.apply_process_env();

        if let Some(database) = &self.database {
            config.database_url = database.clone();
        }
        if let Some(workbook) = &self.workbook {
            config.workbook = workbook.clone();
        }
        Ok(config)
    }
}

/// Open the configured store, or an in-memory one for dry runs
pub async fn open_store(config: &Config, dry_run: bool) -> Result<Arc<dyn DocumentStore>> {
    if dry_run {
        log::info!("Dry run: using an in-memory store");
        return Ok(Arc::new(MemoryStore::new()));
    }
    Ok(Arc::new(SqliteStore::connect(&config.database_url).await?))
}

/// Dispatch a parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    if cli.global.no_color {
        colored::control::set_override(false);
    }

    let config = cli.global.resolve_config()?;

    match cli.command {
        Commands::Import(args) => commands::import::handle_import_command(&config, args).await,
        Commands::UpdateStatus(args) => {
            commands::status::handle_update_status_command(&config, args).await
        }
        Commands::Repopulate(args) => {
            commands::repopulate::handle_repopulate_command(&config, args).await
        }
        Commands::RebuildOrg => commands::rebuild_org::handle_rebuild_org_command(&config).await,
        Commands::Inspect(args) => commands::inspect::handle_inspect_command(&config, args),
    }
}
