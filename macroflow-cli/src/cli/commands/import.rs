//! `import` command handler

use anyhow::Result;
use colored::*;

use crate::cli::output::{print_import_summary, print_missing_workbook, print_sheet_report};
use crate::cli::{ImportArgs, open_store};
use crate::config::Config;
use crate::import::{ImportOutcome, RunContext, import_workbook};

pub async fn handle_import_command(config: &Config, args: ImportArgs) -> Result<()> {
    let store = open_store(config, args.dry_run).await?;
    let ctx = RunContext::new(store, &config.creator_email).await?;

    println!("Importing {}", config.workbook.display().to_string().cyan());
    if args.dry_run {
        println!("{}", "Dry run: nothing will be persisted".yellow());
    }

    match import_workbook(&ctx, &config.workbook).await? {
        ImportOutcome::MissingWorkbook(path) => print_missing_workbook(&path),
        ImportOutcome::Completed(summary) => {
            for report in &summary.sheets {
                print_sheet_report(report);
            }
            print_import_summary(&summary);
        }
    }
    Ok(())
}
