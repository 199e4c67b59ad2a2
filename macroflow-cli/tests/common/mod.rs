//! Workbook fixtures shared by the integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use macroflow::import::{Creator, CreatorSource, RunContext};
use macroflow::store::{Collection, DocumentStore, Filter};
use rust_xlsxwriter::Workbook;

/// Cells of one sheet as (row, column, text)
pub struct SheetFixture {
    pub name: &'static str,
    pub cells: Vec<(u32, u16, &'static str)>,
}

/// Sheet with a title, a header on row 2 and two processes holding three tasks
pub fn network_sheet() -> SheetFixture {
    SheetFixture {
        name: "Réseaux",
        cells: vec![
            (0, 0, "Macro 03: Network Security"),
            (2, 0, "Description Détaillée"),
            (2, 1, "Process"),
            (2, 2, "Description du process"),
            (2, 3, "Identification des tâches"),
            (2, 4, "Directions concernées"),
            (3, 0, "Cette macro couvre la sécurité des réseaux."),
            (3, 1, "Surveillance"),
            (3, 2, "Surveiller le réseau"),
            (3, 3, "Collecter les logs"),
            (3, 4, "Direction Network Engineering, IT"),
            (4, 3, "Analyser les alertes"),
            (5, 1, "Réponse"),
            (5, 2, "Répondre aux incidents"),
            (5, 3, "Isoler la machine"),
            (5, 4, "IT\nDirection Commerciale"),
        ],
    }
}

/// Sheet without any recognisable header
pub fn notes_sheet() -> SheetFixture {
    SheetFixture {
        name: "Notes",
        cells: vec![
            (0, 0, "Remarques générales"),
            (1, 1, "Process"),
            (1, 4, "DSI"),
        ],
    }
}

/// Sheet whose content starts at row 1, column 2 and has no macro title
pub fn offset_sheet() -> SheetFixture {
    SheetFixture {
        name: "Décalé",
        cells: vec![
            (1, 2, "Process"),
            (1, 3, "Description du process"),
            (1, 4, "Identification des tâches"),
            (1, 5, "Directions concernées"),
            (2, 2, "Sauvegarde"),
            (2, 3, "Sauvegarder les serveurs"),
            (2, 4, "Planifier"),
            (2, 5, "Direction Financière"),
        ],
    }
}

/// The three fixture sheets, in workbook order
pub fn all_sheets() -> Vec<SheetFixture> {
    vec![network_sheet(), notes_sheet(), offset_sheet()]
}

/// Write the fixtures as one `.xlsx` file inside `dir`
pub fn write_workbook(dir: &Path, sheets: &[SheetFixture]) -> PathBuf {
    let mut workbook = Workbook::new();
    for fixture in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(fixture.name).unwrap();
        for (row, column, text) in &fixture.cells {
            sheet.write_string(*row, *column, *text).unwrap();
        }
    }

    let path = dir.join("macros.xlsx");
    workbook.save(&path).unwrap();
    path
}

pub fn context(store: Arc<dyn DocumentStore>) -> RunContext {
    RunContext::with_creator(
        store,
        Creator {
            id: "importer".into(),
            source: CreatorSource::ConfiguredUser,
        },
    )
}

pub async fn count(store: &dyn DocumentStore, collection: Collection) -> u64 {
    store.count(collection, &Filter::all()).await.unwrap()
}
