mod common;

use std::sync::Arc;

use macroflow::import::{ImportOutcome, ImportSummary, SheetOutcome, import_workbook};
use macroflow::model::{Department, JobPosition, ProcessDocument, Stored};
use macroflow::store::{Collection, DocumentStore, Filter, MemoryStore, SqliteStore, from_document};

use common::{all_sheets, context, count, network_sheet, notes_sheet, offset_sheet, write_workbook};

async fn records<T: serde::de::DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: Collection,
) -> Vec<Stored<T>> {
    store
        .find_all(collection, &Filter::all())
        .await
        .unwrap()
        .into_iter()
        .map(|doc| from_document(doc).unwrap())
        .collect()
}

fn completed(outcome: ImportOutcome) -> ImportSummary {
    match outcome {
        ImportOutcome::Completed(summary) => summary,
        other => panic!("import did not complete: {:?}", other),
    }
}

#[tokio::test]
async fn test_import_into_memory_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_workbook(dir.path(), &all_sheets());

    let store = Arc::new(MemoryStore::new());
    let ctx = context(store.clone());
    let summary = completed(import_workbook(&ctx, &path).await.unwrap());

    assert_eq!(summary.macros(), 3);
    assert_eq!(summary.processes(), 3);
    assert_eq!(summary.tasks(), 4);
    let skipped: Vec<_> = summary
        .skipped_sheets()
        .map(|s| s.sheet_name.as_str())
        .collect();
    assert_eq!(skipped, vec!["Notes"]);
    assert_eq!(summary.reference().departments_created, 4);
    assert_eq!(summary.reference().job_positions_created, 4);

    let codes: Vec<_> = summary
        .sheets
        .iter()
        .map(|s| s.macro_code.as_str())
        .collect();
    assert_eq!(codes, vec!["Macro03", "Notes", "Décalé"]);

    let db = store.as_ref();
    let departments = records::<Department>(db, Collection::Departments).await;
    let pairs: Vec<_> = departments
        .iter()
        .map(|d| (d.record.name.as_str(), d.record.code.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("Direction Network Engineering", "DNE"),
            ("IT", "IT"),
            ("Direction Commerciale", "DC"),
            ("Direction Financière", "DF"),
        ]
    );

    let positions = records::<JobPosition>(db, Collection::JobPositions).await;
    assert_eq!(positions.len(), 4);
    assert_eq!(positions[0].record.code, "DNE-H");
    assert_eq!(positions[0].record.department_id, departments[0].id);
}

#[tokio::test]
async fn test_content_offset_keeps_sheet_coordinates() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_workbook(dir.path(), &[offset_sheet()]);

    let store = Arc::new(MemoryStore::new());
    let ctx = context(store.clone());
    let summary = completed(import_workbook(&ctx, &path).await.unwrap());

    match &summary.sheets[0].outcome {
        SheetOutcome::Imported {
            header_row,
            processes,
            tasks,
            ..
        } => {
            assert_eq!(*header_row, 1);
            assert_eq!(*processes, 1);
            assert_eq!(*tasks, 1);
        }
        other => panic!("sheet was not imported: {:?}", other),
    }

    let documents = records::<ProcessDocument>(store.as_ref(), Collection::Documents).await;
    let process = &documents[0].record;
    assert_eq!(process.title, "Sauvegarde");
    assert_eq!(process.description, "Sauvegarder les serveurs");
    assert_eq!(process.stakeholders, vec!["Direction Financière"]);
    assert_eq!(process.tasks[0].code, "Décalé_P1_T1");
}

#[tokio::test]
async fn test_import_into_sqlite_is_repeatable() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_workbook(dir.path(), &[network_sheet(), notes_sheet()]);
    let db_path = dir.path().join("data").join("macroflow.db");
    let store = Arc::new(SqliteStore::open(&db_path).await.unwrap());
    let ctx = context(store.clone());
    let db = store.as_ref();

    let first = completed(import_workbook(&ctx, &path).await.unwrap());
    let departments_before = records::<Department>(db, Collection::Departments).await;
    let documents_before = records::<ProcessDocument>(db, Collection::Documents).await;

    let second = completed(import_workbook(&ctx, &path).await.unwrap());
    let departments_after = records::<Department>(db, Collection::Departments).await;
    let documents_after = records::<ProcessDocument>(db, Collection::Documents).await;

    assert_eq!(first.processes(), 2);
    assert_eq!(second.processes(), 2);
    assert_eq!(second.reference().departments_created, 0);

    let ids = |deps: &[Stored<Department>]| -> Vec<(String, String, String)> {
        deps.iter()
            .map(|d| (d.id.clone(), d.record.name.clone(), d.record.code.clone()))
            .collect()
    };
    assert_eq!(ids(&departments_before), ids(&departments_after));

    let keys = |docs: &[Stored<ProcessDocument>]| -> Vec<(String, String, usize)> {
        docs.iter()
            .map(|d| {
                let record = &d.record;
                (d.id.clone(), record.process_code.clone(), record.tasks.len())
            })
            .collect()
    };
    assert_eq!(keys(&documents_before), keys(&documents_after));
    assert_eq!(count(db, Collection::Macros).await, 2);

    let tasks = &documents_after[0].record.tasks;
    let orders: Vec<u32> = tasks.iter().map(|t| t.order).collect();
    assert_eq!(orders, vec![1, 2]);
}

#[tokio::test]
async fn test_missing_workbook_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new());
    let ctx = context(store.clone());

    let missing = dir.path().join("absent.xlsx");
    let outcome = import_workbook(&ctx, &missing).await.unwrap();
    assert!(matches!(outcome, ImportOutcome::MissingWorkbook(_)));
    assert_eq!(count(store.as_ref(), Collection::Macros).await, 0);
}

#[tokio::test]
async fn test_date_task_cell_is_stored_as_date() {
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dates.xlsx");

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Échéances").unwrap();
    sheet.write_string(0, 0, "Macro 04: Planning").unwrap();
    sheet.write_string(1, 1, "Process").unwrap();
    sheet
        .write_string(1, 3, "Identification des tâches")
        .unwrap();
    sheet.write_string(2, 1, "Clôture").unwrap();
    sheet
        .write_datetime_with_format(
            2,
            3,
            ExcelDateTime::from_ymd(2024, 1, 15).unwrap(),
            &Format::new().set_num_format("yyyy-mm-dd"),
        )
        .unwrap();
    workbook.save(&path).unwrap();

    let store = Arc::new(MemoryStore::new());
    let ctx = context(store.clone());
    completed(import_workbook(&ctx, &path).await.unwrap());

    let documents = records::<ProcessDocument>(store.as_ref(), Collection::Documents).await;
    let task = &documents[0].record.tasks[0];
    assert_eq!(task.description, "2024-01-15 00:00:00");
}
