//! Reference data rebuild
//!
//! Walks only the directions column of every sheet and resolves each name into
//! a department and its head job position. Macros and processes are left
//! alone.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::store::Collection;
use crate::workbook::{Sheet, read_workbook};

use super::context::RunContext;
use super::header::locate_directions;
use super::maintenance::{REFERENCE_COLLECTIONS, wipe_collections};
use super::stakeholders::{ReferenceStats, resolve_department, split_stakeholders};

/// Per-sheet result of the directions scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionsReport {
    pub sheet_name: String,
    /// None when the sheet has no header or no directions column
    pub directions_column: Option<usize>,
    pub names_seen: usize,
    pub skipped_rows: usize,
}

/// Result of a reference rebuild
#[derive(Debug, Clone, PartialEq)]
pub enum RebuildOutcome {
    MissingWorkbook(PathBuf),
    Completed {
        cleared: Vec<(Collection, u64)>,
        sheets: Vec<DirectionsReport>,
        stats: ReferenceStats,
    },
}

/// Resolve every directions cell of a sheet
pub async fn scan_directions(
    ctx: &RunContext,
    sheet: &Sheet,
    stats: &mut ReferenceStats,
) -> Result<DirectionsReport> {
    let mut report = DirectionsReport {
        sheet_name: sheet.name.clone(),
        directions_column: None,
        names_seen: 0,
        skipped_rows: 0,
    };

    let Some((header_row, column)) = locate_directions(sheet) else {
        log::warn!("No directions column found in '{}', skipping", sheet.name);
        return Ok(report);
    };
    report.directions_column = Some(column);

    for row in header_row + 1..sheet.height() {
        let directions = match sheet.text(row, column) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Sheet '{}': skipping row {}: {}", sheet.name, row, e);
                report.skipped_rows += 1;
                continue;
            }
        };

        for name in split_stakeholders(&directions) {
            let resolved = resolve_department(ctx, &name)
                .await
                .with_context(|| format!("Sheet '{}': cannot resolve '{}'", sheet.name, name))?;
            stats.record(&resolved);
            report.names_seen += 1;
        }
    }

    Ok(report)
}

/// Clear departments and job positions, then rebuild them from the workbook.
/// Nothing is deleted when the workbook is missing.
pub async fn rebuild_reference_data(ctx: &RunContext, path: &Path) -> Result<RebuildOutcome> {
    if !path.exists() {
        log::warn!("Workbook not found: {}", path.display());
        return Ok(RebuildOutcome::MissingWorkbook(path.to_path_buf()));
    }
    let sheets = read_workbook(path)?;

    let cleared = wipe_collections(ctx.store(), &REFERENCE_COLLECTIONS).await?;

    let mut stats = ReferenceStats::default();
    let mut reports = Vec::with_capacity(sheets.len());
    for sheet in &sheets {
        reports.push(scan_directions(ctx, sheet, &mut stats).await?);
    }

    Ok(RebuildOutcome::Completed {
        cleared,
        sheets: reports,
        stats,
    })
}
