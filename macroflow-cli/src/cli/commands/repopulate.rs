//! `repopulate` command handler

use anyhow::Result;
use colored::*;

use crate::cli::output::{
    print_cleared, print_heading, print_import_summary, print_missing_workbook, print_sheet_report,
};
use crate::cli::{ImportArgs, open_store};
use crate::config::Config;
use crate::import::{RepopulateOutcome, RunContext, repopulate_workbook};

pub async fn handle_repopulate_command(config: &Config, args: ImportArgs) -> Result<()> {
    let store = open_store(config, args.dry_run).await?;
    let ctx = RunContext::new(store, &config.creator_email).await?;

    println!(
        "Repopulating from {}",
        config.workbook.display().to_string().cyan()
    );
    if args.dry_run {
        println!("{}", "Dry run: nothing will be persisted".yellow());
    }

    match repopulate_workbook(&ctx, &config.workbook).await? {
        RepopulateOutcome::MissingWorkbook(path) => {
            print_missing_workbook(&path);
            println!("Existing data was left untouched");
        }
        RepopulateOutcome::Completed { cleared, summary } => {
            print_heading("Cleared collections");
            print_cleared(&cleared);
            println!();
            for report in &summary.sheets {
                print_sheet_report(report);
            }
            print_import_summary(&summary);
        }
    }
    Ok(())
}
