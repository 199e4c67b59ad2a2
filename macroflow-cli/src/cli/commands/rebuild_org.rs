//! `rebuild-org` command handler

use anyhow::Result;
use colored::*;

use crate::cli::open_store;
use crate::cli::output::{
    print_cleared, print_heading, print_missing_workbook, print_reference_stats,
};
use crate::config::Config;
use crate::import::RunContext;
use crate::import::reference::{RebuildOutcome, rebuild_reference_data};

pub async fn handle_rebuild_org_command(config: &Config) -> Result<()> {
    let store = open_store(config, false).await?;
    let ctx = RunContext::new(store, &config.creator_email).await?;

    println!(
        "Rebuilding departments and job positions from {}",
        config.workbook.display().to_string().cyan()
    );

    match rebuild_reference_data(&ctx, &config.workbook).await? {
        RebuildOutcome::MissingWorkbook(path) => {
            print_missing_workbook(&path);
            println!("Existing data was left untouched");
        }
        RebuildOutcome::Completed {
            cleared,
            sheets,
            stats,
        } => {
            print_heading("Cleared collections");
            print_cleared(&cleared);
            println!();

            for sheet in &sheets {
                match sheet.directions_column {
                    Some(column) => println!(
                        "Sheet {}: {} names from column {}",
                        sheet.sheet_name.bright_white().bold(),
                        sheet.names_seen,
                        column
                    ),
                    None => println!(
                        "Sheet {}: {}",
                        sheet.sheet_name.bright_white().bold(),
                        "no directions column, skipped".yellow()
                    ),
                }
                if sheet.skipped_rows > 0 {
                    println!(
                        "  {} {} rows skipped",
                        "!".yellow().bold(),
                        sheet.skipped_rows
                    );
                }
            }

            println!();
            print_heading("Reference data");
            print_reference_stats(&stats);
        }
    }
    Ok(())
}
