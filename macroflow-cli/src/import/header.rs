//! Header row detection and column role mapping
//!
//! Sheet layouts drift between macros, so every column role is resolved by an
//! ordered list of [`ColumnStrategy`] values: the first strategy that yields an
//! index wins.

use crate::workbook::{Cell, Sheet};

/// Rows inspected when looking for the header
pub const HEADER_SCAN_ROWS: usize = 10;

/// Markers that must all appear somewhere in the header row
const HEADER_MARKERS: [&str; 2] = ["process", "tâches"];

/// Header cells at least this long are never the process title column
const TITLE_HEADER_MAX_CHARS: usize = 20;

/// Semantic role of a sheet column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    ProcessTitle,
    ProcessDescription,
    Tasks,
    Directions,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 4] = [
        ColumnRole::ProcessTitle,
        ColumnRole::ProcessDescription,
        ColumnRole::Tasks,
        ColumnRole::Directions,
    ];

    /// Column used when no header keyword matches
    pub fn default_position(&self) -> usize {
        match self {
            ColumnRole::ProcessTitle => 1,
            ColumnRole::ProcessDescription => 2,
            ColumnRole::Tasks => 3,
            ColumnRole::Directions => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ColumnRole::ProcessTitle => "process title",
            ColumnRole::ProcessDescription => "process description",
            ColumnRole::Tasks => "tasks",
            ColumnRole::Directions => "directions",
        }
    }
}

/// One way of locating a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnStrategy {
    /// Last header cell whose text classifies as the role
    Keyword,
    /// Fixed index, used even if the sheet is narrower
    Position(usize),
    /// Fixed index, only when the sheet has that column
    PositionIfPresent(usize),
}

impl ColumnStrategy {
    fn locate(&self, role: ColumnRole, headers: &[Cell], width: usize) -> Option<usize> {
        match self {
            ColumnStrategy::Keyword => headers
                .iter()
                .enumerate()
                .filter(|(_, cell)| classify_header(&cell.display()) == Some(role))
                .map(|(idx, _)| idx)
                .last(),
            ColumnStrategy::Position(idx) => Some(*idx),
            ColumnStrategy::PositionIfPresent(idx) => (*idx < width).then_some(*idx),
        }
    }
}

/// Strategies for the full importer: keyword, then the role's fixed position
pub fn import_strategies(role: ColumnRole) -> [ColumnStrategy; 2] {
    [
        ColumnStrategy::Keyword,
        ColumnStrategy::Position(role.default_position()),
    ]
}

/// Strategies for the directions-only reference rebuild
pub const DIRECTIONS_ONLY_STRATEGIES: [ColumnStrategy; 2] = [
    ColumnStrategy::Keyword,
    ColumnStrategy::PositionIfPresent(4),
];

/// Column indices for every role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub process_title: usize,
    pub process_description: usize,
    pub tasks: usize,
    pub directions: usize,
}

impl ColumnMap {
    pub fn get(&self, role: ColumnRole) -> usize {
        match role {
            ColumnRole::ProcessTitle => self.process_title,
            ColumnRole::ProcessDescription => self.process_description,
            ColumnRole::Tasks => self.tasks,
            ColumnRole::Directions => self.directions,
        }
    }
}

/// Detected header row and column mapping of a sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLayout {
    pub row: usize,
    pub columns: ColumnMap,
}

/// Classify a header cell. Rules are checked in order and the first match wins.
pub fn classify_header(text: &str) -> Option<ColumnRole> {
    let value = text.trim().to_lowercase();

    if value.contains("process")
        && !value.contains("description")
        && value.chars().count() < TITLE_HEADER_MAX_CHARS
    {
        Some(ColumnRole::ProcessTitle)
    } else if value.contains("description") && value.contains("process") {
        Some(ColumnRole::ProcessDescription)
    } else if value.contains("tâches") {
        Some(ColumnRole::Tasks)
    } else if value.contains("concernées") || value.contains("directions") {
        Some(ColumnRole::Directions)
    } else {
        None
    }
}

/// First row within the scan window that carries every header marker
pub fn find_header_row(sheet: &Sheet) -> Option<usize> {
    (0..sheet.height().min(HEADER_SCAN_ROWS)).find(|&row| {
        let values: Vec<String> = sheet
            .row(row)
            .iter()
            .map(|cell| cell.display().to_lowercase())
            .collect();
        HEADER_MARKERS
            .iter()
            .all(|marker| values.iter().any(|v| v.contains(marker)))
    })
}

/// Resolve a role by trying each strategy in turn
pub fn locate_column(
    role: ColumnRole,
    headers: &[Cell],
    width: usize,
    strategies: &[ColumnStrategy],
) -> Option<(usize, ColumnStrategy)> {
    strategies.iter().find_map(|strategy| {
        let idx = strategy.locate(role, headers, width)?;
        Some((idx, *strategy))
    })
}

/// Map every role for the full importer. Never fails: positions are the last resort.
pub fn map_columns(headers: &[Cell], width: usize) -> ColumnMap {
    let resolve = |role: ColumnRole| {
        let fallback = role.default_position();
        let (idx, strategy) = locate_column(role, headers, width, &import_strategies(role))
            .unwrap_or((fallback, ColumnStrategy::Position(fallback)));
        if strategy != ColumnStrategy::Keyword {
            log::debug!(
                "Column for {} not named in header, using index {}",
                role.label(),
                idx
            );
        }
        idx
    };

    ColumnMap {
        process_title: resolve(ColumnRole::ProcessTitle),
        process_description: resolve(ColumnRole::ProcessDescription),
        tasks: resolve(ColumnRole::Tasks),
        directions: resolve(ColumnRole::Directions),
    }
}

/// Locate the header row and map its columns
pub fn locate_header(sheet: &Sheet) -> Option<HeaderLayout> {
    let row = find_header_row(sheet)?;
    let columns = map_columns(sheet.row(row), sheet.width());
    Some(HeaderLayout { row, columns })
}

/// Locate the header row and only the directions column
pub fn locate_directions(sheet: &Sheet) -> Option<(usize, usize)> {
    let row = find_header_row(sheet)?;
    let (column, _) = locate_column(
        ColumnRole::Directions,
        sheet.row(row),
        sheet.width(),
        &DIRECTIONS_ONLY_STRATEGIES,
    )?;
    Some((row, column))
}
