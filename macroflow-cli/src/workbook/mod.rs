//! Workbook loading
//!
//! Sheets are materialised as plain grids addressed by absolute sheet
//! coordinates: a sheet whose data starts at B3 still has its first value at
//! row 2, column 1. Cells outside the used area read as [`Cell::Empty`].

use std::path::Path;

use anyhow::{Context, Result};
use calamine::{Data, ExcelDateTime, Range, Reader, Xlsx, open_workbook};

/// A single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Spreadsheet error value such as `#N/A` or `#REF!`
    Invalid(String),
}

/// A cell that cannot be read as text
#[derive(Debug, Clone, PartialEq)]
pub struct CellError {
    pub row: usize,
    pub column: usize,
    pub value: String,
}

impl std::fmt::Display for CellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "malformed value {} at row {}, column {}",
            self.value, self.row, self.column
        )
    }
}

impl std::error::Error for CellError {}

static EMPTY: Cell = Cell::Empty;

impl Cell {
    /// Convert a calamine cell
    pub fn from_data(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => Cell::Text(format_datetime(dt)),
            Data::DateTimeIso(s) => Cell::Text(s.clone()),
            Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(e) => Cell::Invalid(format!("{}", e)),
        }
    }

    /// Cell rendered as text, error values included
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(f) => format_number(*f),
            Cell::Bool(b) => b.to_string(),
            Cell::Invalid(e) => e.clone(),
        }
    }

    /// Trimmed text content. Error values are rejected.
    pub fn text(&self) -> std::result::Result<String, String> {
        match self {
            Cell::Invalid(e) => Err(e.clone()),
            other => Ok(other.display().trim().to_string()),
        }
    }
}

/// Dates print as `2024-01-15 00:00:00`; durations keep their serial value
fn format_datetime(dt: &ExcelDateTime) -> String {
    if dt.is_duration() {
        return format_number(dt.as_f64());
    }
    match dt.as_datetime() {
        Some(value) => value.to_string(),
        None => format_number(dt.as_f64()),
    }
}

/// Whole numbers print without a fractional part
fn format_number(f: f64) -> String {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        format!("{}", f as i64)
    } else {
        format!("{}", f)
    }
}

/// A sheet rendered as a grid of cells
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    rows: Vec<Vec<Cell>>,
    width: usize,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        Self {
            name: name.into(),
            rows,
            width,
        }
    }

    /// Build a sheet from a calamine range, padding to absolute coordinates
    pub fn from_range(name: impl Into<String>, range: &Range<Data>) -> Self {
        let (start_row, start_col) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); start_row];
        for data_row in range.rows() {
            let mut row = vec![Cell::Empty; start_col];
            row.extend(data_row.iter().map(Cell::from_data));
            rows.push(row);
        }

        Self::new(name, rows)
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns of the widest row
    pub fn width(&self) -> usize {
        self.width
    }

    /// Row contents; rows past the end are empty
    pub fn row(&self, row: usize) -> &[Cell] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cell at (row, column); out-of-bounds reads as empty
    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&EMPTY)
    }

    /// Trimmed text of a cell, reporting error values with their position
    pub fn text(&self, row: usize, column: usize) -> std::result::Result<String, CellError> {
        self.cell(row, column)
            .text()
            .map_err(|value| CellError { row, column, value })
    }

    /// Trimmed text of a cell with error values rendered as text
    pub fn text_lossy(&self, row: usize, column: usize) -> String {
        self.cell(row, column).display().trim().to_string()
    }
}

/// Read every sheet of an `.xlsx` workbook, in workbook order
pub fn read_workbook<P: AsRef<Path>>(path: P) -> Result<Vec<Sheet>> {
    let path = path.as_ref();
    let mut workbook: Xlsx<_> = open_workbook(path)
        .with_context(|| format!("Failed to open Excel file: {}", path.display()))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for sheet_name in sheet_names {
        let range = workbook
            .worksheet_range(&sheet_name)
            .with_context(|| format!("Failed to read sheet: {}", sheet_name))?;
        log::debug!(
            "Loaded sheet '{}' ({} rows, starting at {:?})",
            sheet_name,
            range.height(),
            range.start()
        );
        sheets.push(Sheet::from_range(sheet_name, &range));
    }

    Ok(sheets)
}
