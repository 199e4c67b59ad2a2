//! Console rendering shared by the command handlers

use colored::*;

use crate::import::stakeholders::ReferenceStats;
use crate::import::{ImportSummary, SheetOutcome, SheetReport};
use crate::store::Collection;
use crate::workbook::Cell;

/// Longest cell text shown by `inspect`
const PREVIEW_CELL_CHARS: usize = 40;

pub fn print_heading(text: &str) {
    println!("{}", text.bright_blue().bold());
}

pub fn print_missing_workbook(path: &std::path::Path) {
    println!(
        "{} Workbook not found: {}",
        "!".yellow().bold(),
        path.display().to_string().cyan()
    );
}

pub fn print_cleared(cleared: &[(Collection, u64)]) {
    for (collection, deleted) in cleared {
        println!("  Deleted {} {}", deleted.to_string().bold(), collection);
    }
}

/// One line per sheet as it is imported
pub fn print_sheet_report(report: &SheetReport) {
    println!(
        "Processing Macro: {} ({})",
        report.sheet_name.bright_white().bold(),
        report.macro_code.cyan()
    );

    match &report.outcome {
        SheetOutcome::Skipped => {
            println!(
                "  {} Header row not found, processes skipped",
                "!".yellow().bold()
            );
        }
        SheetOutcome::Imported {
            processes,
            tasks,
            skipped_rows,
            orphan_tasks,
            ..
        } => {
            println!(
                "  -> Created/Updated {} processes with {} tasks",
                processes.to_string().green(),
                tasks.to_string().green()
            );
            if !skipped_rows.is_empty() {
                println!(
                    "  {} {} rows skipped (unreadable cells)",
                    "!".yellow().bold(),
                    skipped_rows.len()
                );
            }
            if *orphan_tasks > 0 {
                println!(
                    "  {} {} tasks found before the first process were dropped",
                    "!".yellow().bold(),
                    orphan_tasks
                );
            }
        }
    }
}

pub fn print_reference_stats(stats: &ReferenceStats) {
    println!(
        "Departments created: {}",
        stats.departments_created.to_string().bold()
    );
    println!(
        "Job positions created: {}",
        stats.job_positions_created.to_string().bold()
    );
}

pub fn print_import_summary(summary: &ImportSummary) {
    println!();
    print_heading("Import summary");
    println!("Total Macros: {}", summary.macros().to_string().bold());
    println!(
        "Total Processes: {}",
        summary.processes().to_string().bold()
    );
    println!("Total Tasks: {}", summary.tasks().to_string().bold());
    print_reference_stats(&summary.reference());

    let skipped: Vec<&str> = summary
        .skipped_sheets()
        .map(|s| s.sheet_name.as_str())
        .collect();
    if !skipped.is_empty() {
        println!("{} {}", "Skipped sheets:".yellow(), skipped.join(", "));
    }
}

/// Render a row for previews: cells separated by ` | `, long text shortened
pub fn format_row(cells: &[Cell]) -> String {
    cells
        .iter()
        .map(|cell| shorten(&cell.display().replace('\n', " "), PREVIEW_CELL_CHARS))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn shorten(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    short.push_str("...");
    short
}
