//! Row grouping: turns the data rows under a header into process groups
//!
//! Process titles are usually merged cells, so only the first row of a group
//! carries the title. A row opens a new group when its title cell is filled and
//! differs from the open group's title; every other row continues the open
//! group.

use crate::workbook::{CellError, Sheet};

use super::header::HeaderLayout;

/// Text of the role cells of one data row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowCells {
    pub title: String,
    pub description: String,
    pub tasks: String,
    pub directions: String,
}

/// Read the role cells of a row. Columns past the sheet width read as empty.
pub fn read_row(sheet: &Sheet, row: usize, layout: &HeaderLayout) -> Result<RowCells, CellError> {
    let columns = &layout.columns;
    Ok(RowCells {
        title: sheet.text(row, columns.process_title)?,
        description: sheet.text(row, columns.process_description)?,
        tasks: sheet.text(row, columns.tasks)?,
        directions: sheet.text(row, columns.directions)?,
    })
}

/// Consecutive rows belonging to one process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessGroup {
    /// 1-based position of the group within the sheet
    pub sequence: usize,
    /// Sheet row that opened the group
    pub row: usize,
    pub title: String,
    pub description: String,
    /// Raw directions cell of the opening row
    pub directions: String,
    /// Task descriptions in row order
    pub tasks: Vec<String>,
}

/// Result of walking a sheet's data rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedRows {
    pub groups: Vec<ProcessGroup>,
    /// Rows skipped because a cell held a malformed value
    pub skipped_rows: Vec<CellError>,
    /// Task cells seen before any process was opened
    pub orphan_tasks: usize,
}

impl GroupedRows {
    pub fn task_count(&self) -> usize {
        self.groups.iter().map(|g| g.tasks.len()).sum()
    }
}

/// Walk every row below the header, in sheet order
pub fn group_rows(sheet: &Sheet, layout: &HeaderLayout) -> GroupedRows {
    let mut grouped = GroupedRows::default();

    for row in layout.row + 1..sheet.height() {
        let cells = match read_row(sheet, row, layout) {
            Ok(cells) => cells,
            Err(e) => {
                log::warn!("Sheet '{}': skipping row {}: {}", sheet.name, row, e);
                grouped.skipped_rows.push(e);
                continue;
            }
        };

        let opens_group = !cells.title.is_empty()
            && grouped.groups.last().map(|g| g.title.as_str()) != Some(cells.title.as_str());

        if opens_group {
            grouped.groups.push(ProcessGroup {
                sequence: grouped.groups.len() + 1,
                row,
                title: cells.title,
                description: cells.description,
                directions: cells.directions,
                tasks: Vec::new(),
            });
        }

        if cells.tasks.is_empty() {
            continue;
        }

        match grouped.groups.last_mut() {
            Some(group) => group.tasks.push(cells.tasks),
            None => {
                log::warn!(
                    "Sheet '{}': task on row {} appears before any process, ignoring it",
                    sheet.name,
                    row
                );
                grouped.orphan_tasks += 1;
            }
        }
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::header::locate_header;
    use crate::workbook::Cell;

    fn row(values: &[&str]) -> Vec<Cell> {
        values
            .iter()
            .map(|v| {
                if v.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(v.to_string())
                }
            })
            .collect()
    }

    fn header() -> Vec<Cell> {
        row(&[
            "Description Détaillée",
            "Process",
            "Description du process",
            "Identification des tâches",
            "Directions concernées",
        ])
    }

    fn group(sheet: &Sheet) -> GroupedRows {
        let layout = locate_header(sheet).unwrap();
        group_rows(sheet, &layout)
    }

    #[test]
    fn test_merged_titles_continue_group() {
        let sheet = Sheet::new(
            "S",
            vec![
                header(),
                row(&[
                    "",
                    "Planification",
                    "Planifier le réseau",
                    "Collecter les besoins",
                    "DNE, IT",
                ]),
                row(&["", "", "", "Rédiger le plan", ""]),
                row(&["", "   ", "", "Valider", ""]),
                row(&["", "Déploiement", "Déployer", "Installer", "IT"]),
                row(&["", "", "", "Tester", ""]),
            ],
        );

        let grouped = group(&sheet);
        assert_eq!(grouped.groups.len(), 2);

        let first = &grouped.groups[0];
        assert_eq!(first.sequence, 1);
        assert_eq!(first.row, 1);
        assert_eq!(first.title, "Planification");
        assert_eq!(first.description, "Planifier le réseau");
        assert_eq!(first.directions, "DNE, IT");
        assert_eq!(
            first.tasks,
            vec!["Collecter les besoins", "Rédiger le plan", "Valider"]
        );

        let second = &grouped.groups[1];
        assert_eq!(second.sequence, 2);
        assert_eq!(second.tasks, vec!["Installer", "Tester"]);
        assert_eq!(grouped.task_count(), 5);
    }

    #[test]
    fn test_repeated_title_continues_group() {
        let sheet = Sheet::new(
            "S",
            vec![
                header(),
                row(&["", "Audit", "", "T1", ""]),
                row(&["", "Audit", "", "T2", ""]),
                row(&["", "Revue", "", "T3", ""]),
                row(&["", "Audit", "", "T4", ""]),
            ],
        );

        let grouped = group(&sheet);
        let titles: Vec<_> = grouped.groups.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(titles, vec!["Audit", "Revue", "Audit"]);
        assert_eq!(grouped.groups[0].tasks, vec!["T1", "T2"]);
        assert_eq!(grouped.groups[2].sequence, 3);
    }

    #[test]
    fn test_group_without_tasks() {
        let sheet = Sheet::new("S", vec![header(), row(&["", "Vide", "Rien à faire"])]);
        let grouped = group(&sheet);
        assert_eq!(grouped.groups.len(), 1);
        assert!(grouped.groups[0].tasks.is_empty());
    }

    #[test]
    fn test_tasks_before_first_process_are_dropped() {
        let sheet = Sheet::new(
            "S",
            vec![
                header(),
                row(&["", "", "", "Orpheline", ""]),
                row(&["", "P", "", "T", ""]),
            ],
        );
        let grouped = group(&sheet);
        assert_eq!(grouped.orphan_tasks, 1);
        assert_eq!(grouped.groups[0].tasks, vec!["T"]);
    }

    #[test]
    fn test_malformed_row_is_skipped() {
        let mut bad = row(&["", "", "", "", ""]);
        bad[3] = Cell::Invalid("#N/A".into());

        let sheet = Sheet::new(
            "S",
            vec![
                header(),
                row(&["", "P", "", "T1", ""]),
                bad,
                row(&["", "", "", "T2", ""]),
            ],
        );

        let grouped = group(&sheet);
        assert_eq!(grouped.skipped_rows.len(), 1);
        assert_eq!(grouped.skipped_rows[0].row, 2);
        assert_eq!(grouped.groups[0].tasks, vec!["T1", "T2"]);
    }

    #[test]
    fn test_narrow_sheet_reads_missing_columns_as_empty() {
        let sheet = Sheet::new(
            "S",
            vec![
                row(&["Process", "Identification des tâches"]),
                row(&["", "Collecte"]),
                row(&["", "Analyse"]),
            ],
        );
        // Title column is found by keyword at 0, tasks at 1, directions falls
        // back to position 4 which is past the sheet width
        let grouped = group(&sheet);
        assert!(grouped.groups.is_empty());
        assert_eq!(grouped.orphan_tasks, 2);
        assert!(grouped.skipped_rows.is_empty());
    }
}
