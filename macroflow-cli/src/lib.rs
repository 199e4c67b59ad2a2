//! Macro-process workbook importer
//!
//! Reads `.xlsx` workbooks where every sheet describes one macro-process and
//! writes macros, process documents, departments and job positions into a
//! document store.

pub mod cli;
pub mod config;
pub mod import;
pub mod model;
pub mod store;
pub mod workbook;
