//! Workbook import
//!
//! One sheet is one macro. For every sheet the importer:
//! 1. upserts the macro record (title cell, description cell)
//! 2. locates the header row, skipping the sheet when there is none
//! 3. groups data rows into processes and upserts each process document
//! 4. resolves the process stakeholders into departments and job positions
//!
//! Macros and processes are replaced on every run; departments and job
//! positions are only ever inserted.

pub mod context;
pub mod grouper;
pub mod header;
pub mod macro_title;
pub mod maintenance;
pub mod reference;
pub mod stakeholders;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;

use crate::model::{
    Contributors, DocumentMetadata, DocumentStatus, INITIAL_DOCUMENT_VERSION, Macro,
    ProcessDocument, Task, process_code,
};
use crate::store::{Collection, Document, Filter, to_document};
use crate::workbook::{CellError, Sheet, read_workbook};

pub use context::{Creator, CreatorSource, RunContext};
use grouper::{ProcessGroup, group_rows};
use header::locate_header;
use macro_title::extract_macro;
use maintenance::{IMPORTED_COLLECTIONS, wipe_collections};
use stakeholders::{ReferenceStats, resolve_stakeholders};

/// What happened to one sheet
#[derive(Debug, Clone, PartialEq)]
pub enum SheetOutcome {
    /// No header row within the scan window; only the macro record was written
    Skipped,
    Imported {
        header_row: usize,
        processes: usize,
        tasks: usize,
        skipped_rows: Vec<CellError>,
        orphan_tasks: usize,
    },
}

/// Per-sheet import report
#[derive(Debug, Clone, PartialEq)]
pub struct SheetReport {
    pub sheet_name: String,
    pub macro_code: String,
    pub macro_id: String,
    pub outcome: SheetOutcome,
    pub reference: ReferenceStats,
}

impl SheetReport {
    pub fn processes(&self) -> usize {
        match &self.outcome {
            SheetOutcome::Imported { processes, .. } => *processes,
            SheetOutcome::Skipped => 0,
        }
    }

    pub fn tasks(&self) -> usize {
        match &self.outcome {
            SheetOutcome::Imported { tasks, .. } => *tasks,
            SheetOutcome::Skipped => 0,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, SheetOutcome::Skipped)
    }
}

/// Totals for a whole workbook
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportSummary {
    pub sheets: Vec<SheetReport>,
}

impl ImportSummary {
    pub fn macros(&self) -> usize {
        self.sheets.len()
    }

    pub fn processes(&self) -> usize {
        self.sheets.iter().map(SheetReport::processes).sum()
    }

    pub fn tasks(&self) -> usize {
        self.sheets.iter().map(SheetReport::tasks).sum()
    }

    pub fn skipped_sheets(&self) -> impl Iterator<Item = &SheetReport> {
        self.sheets.iter().filter(|s| s.is_skipped())
    }

    pub fn reference(&self) -> ReferenceStats {
        let mut total = ReferenceStats::default();
        for sheet in &self.sheets {
            total.merge(sheet.reference);
        }
        total
    }
}

/// Result of an import invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    /// The workbook file does not exist; nothing was written
    MissingWorkbook(PathBuf),
    Completed(ImportSummary),
}

/// Result of a full repopulation
#[derive(Debug, Clone, PartialEq)]
pub enum RepopulateOutcome {
    /// The workbook file does not exist; nothing was cleared
    MissingWorkbook(PathBuf),
    Completed {
        cleared: Vec<(Collection, u64)>,
        summary: ImportSummary,
    },
}

/// Import every sheet of the workbook at `path`
pub async fn import_workbook(ctx: &RunContext, path: &Path) -> Result<ImportOutcome> {
    if !path.exists() {
        log::warn!("Workbook not found: {}", path.display());
        return Ok(ImportOutcome::MissingWorkbook(path.to_path_buf()));
    }

    let sheets = read_workbook(path)?;
    log::info!(
        "Found {} sheets (macros) in {}",
        sheets.len(),
        path.display()
    );

    Ok(ImportOutcome::Completed(import_sheets(ctx, &sheets).await?))
}

/// Clear every imported collection, then import the workbook from scratch.
/// The workbook is read before anything is deleted.
pub async fn repopulate_workbook(ctx: &RunContext, path: &Path) -> Result<RepopulateOutcome> {
    if !path.exists() {
        log::warn!("Workbook not found: {}", path.display());
        return Ok(RepopulateOutcome::MissingWorkbook(path.to_path_buf()));
    }
    let sheets = read_workbook(path)?;

    let cleared = wipe_collections(ctx.store(), &IMPORTED_COLLECTIONS).await?;
    let summary = import_sheets(ctx, &sheets).await?;

    Ok(RepopulateOutcome::Completed { cleared, summary })
}

/// Import already loaded sheets, in order
pub async fn import_sheets(ctx: &RunContext, sheets: &[Sheet]) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    for sheet in sheets {
        let report = import_sheet(ctx, sheet)
            .await
            .with_context(|| format!("Failed to import sheet '{}'", sheet.name))?;
        summary.sheets.push(report);
    }
    Ok(summary)
}

/// Import a single sheet as a macro with its processes
pub async fn import_sheet(ctx: &RunContext, sheet: &Sheet) -> Result<SheetReport> {
    log::info!("Processing macro sheet '{}'", sheet.name);

    let draft = extract_macro(sheet);
    let now = Utc::now();
    let record = Macro {
        code: draft.identity.code.clone(),
        name: draft.identity.name.clone(),
        short_description: draft.short_description,
        description: draft.description,
        is_active: true,
        created_by: ctx.creator.id.clone(),
        created_at: now,
        updated_at: now,
    };

    let macro_id = ctx
        .store()
        .replace_upsert(
            Collection::Macros,
            &Filter::all().where_eq("code", record.code.as_str()),
            to_document(&record)?,
        )
        .await
        .with_context(|| format!("Failed to upsert macro {}", record.code))?
        .id()
        .to_string();

    let mut report = SheetReport {
        sheet_name: sheet.name.clone(),
        macro_code: record.code.clone(),
        macro_id: macro_id.clone(),
        outcome: SheetOutcome::Skipped,
        reference: ReferenceStats::default(),
    };

    let Some(layout) = locate_header(sheet) else {
        log::warn!(
            "Could not find header row for '{}', skipping details",
            sheet.name
        );
        return Ok(report);
    };
    log::debug!(
        "Sheet '{}': header on row {}, columns {:?}",
        sheet.name,
        layout.row,
        layout.columns
    );

    let grouped = group_rows(sheet, &layout);

    // The open process is written when its group starts and receives its
    // tasks once the group is closed.
    let mut tasks = 0;
    let stats = &mut report.reference;
    for group in &grouped.groups {
        let process_id = upsert_process(ctx, &record.code, &macro_id, group, stats)
            .await?;
        let code = process_code(&record.code, group.sequence);
        tasks += flush_tasks(ctx, &process_id, &code, group).await?;
    }

    report.outcome = SheetOutcome::Imported {
        header_row: layout.row,
        processes: grouped.groups.len(),
        tasks,
        skipped_rows: grouped.skipped_rows,
        orphan_tasks: grouped.orphan_tasks,
    };
    Ok(report)
}

/// Write a process document with an empty task list, returning its id
async fn upsert_process(
    ctx: &RunContext,
    macro_code: &str,
    macro_id: &str,
    group: &ProcessGroup,
    reference: &mut ReferenceStats,
) -> Result<String> {
    let stakeholders = resolve_stakeholders(ctx, &group.directions, reference).await?;
    let now = Utc::now();

    let document = ProcessDocument {
        macro_id: macro_id.to_string(),
        process_code: process_code(macro_code, group.sequence),
        title: group.title.clone(),
        description: group.description.clone(),
        stakeholders: stakeholders.clone(),
        tasks: Vec::new(),
        status: DocumentStatus::Draft,
        version: INITIAL_DOCUMENT_VERSION.to_string(),
        is_active: true,
        created_by: ctx.creator.id.clone(),
        created_at: now,
        updated_at: now,
        contributors: Contributors::default(),
        metadata: DocumentMetadata {
            implicated_actors: stakeholders,
            ..DocumentMetadata::default()
        },
    };

    let outcome = ctx
        .store()
        .replace_upsert(
            Collection::Documents,
            &Filter::all()
                .where_eq("title", group.title.as_str())
                .where_eq("macro_id", macro_id),
            to_document(&document)?,
        )
        .await
        .with_context(|| format!("Failed to upsert process '{}'", group.title))?;

    let action = if outcome.was_inserted() {
        "Created"
    } else {
        "Replaced"
    };
    log::debug!(
        "{} process {} '{}'",
        action,
        document.process_code,
        group.title
    );
    Ok(outcome.id().to_string())
}

/// Store the group's tasks on its process record, returning the task count
async fn flush_tasks(
    ctx: &RunContext,
    process_id: &str,
    process_code: &str,
    group: &ProcessGroup,
) -> Result<usize> {
    let tasks: Vec<Task> = group
        .tasks
        .iter()
        .enumerate()
        .map(|(idx, description)| Task::new(process_code, idx as u32 + 1, description.as_str()))
        .collect();

    let mut fields = Document::new();
    fields.insert(
        "tasks".to_string(),
        serde_json::to_value(&tasks).context("Failed to encode tasks")?,
    );
    ctx.store()
        .update_one(Collection::Documents, &Filter::by_id(process_id), fields)
        .await
        .with_context(|| format!("Failed to store tasks of {}", process_code))?;

    Ok(tasks.len())
}
