//! `inspect` command handler
//!
//! Read-only: never opens the store.

use anyhow::Result;
use colored::*;

use crate::cli::InspectArgs;
use crate::cli::output::{format_row, print_missing_workbook};
use crate::config::Config;
use crate::import::header::{ColumnRole, locate_header};
use crate::import::macro_title::extract_macro;
use crate::workbook::read_workbook;

pub fn handle_inspect_command(config: &Config, args: InspectArgs) -> Result<()> {
    if !config.workbook.exists() {
        print_missing_workbook(&config.workbook);
        return Ok(());
    }

    let sheets = read_workbook(&config.workbook)?;
    let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
    println!("Sheets ({}): {}", sheets.len(), names.join(", ").cyan());

    for sheet in &sheets {
        println!();
        println!(
            "{} {} ({} rows x {} columns)",
            "Sheet:".bright_blue().bold(),
            sheet.name.bright_white().bold(),
            sheet.height(),
            sheet.width()
        );

        let identity = extract_macro(sheet).identity;
        println!("  Macro: {} / {}", identity.code.cyan(), identity.name);

        for row in 0..args.rows.min(sheet.height()) {
            println!("  {:>3}: {}", row, format_row(sheet.row(row)).dimmed());
        }

        match locate_header(sheet) {
            Some(layout) => {
                println!("  Header row: {}", layout.row.to_string().green());
                for role in ColumnRole::ALL {
                    println!(
                        "    {:<20} column {}",
                        role.label(),
                        layout.columns.get(role)
                    );
                }
            }
            None => println!("  {}", "Header row not found".yellow()),
        }
    }
    Ok(())
}
