//! Catalog tables and the two views a reconciliation run mutates.
//!
//! A catalog is always loaded into a [`Ledger`] (name-addressed text rows).
//! Spreadsheet uploads additionally get a [`SpreadsheetView`] that keeps the
//! original cell types and carries per-row change markers for export.

pub mod catalog;
pub mod columns;
pub mod error;
pub mod ledger;
pub mod mutate;
pub mod report;
pub mod sheet;
pub mod write;

pub use catalog::{load_catalog, load_catalog_file, Catalog, SourceFormat};
pub use columns::ColumnMap;
pub use error::LedgerError;
pub use ledger::Ledger;
pub use mutate::{apply, MutationEffect};
pub use report::{report_to_bytes, report_to_csv, report_to_xlsx, REPORT_HEADERS};
pub use sheet::{CellValue, SheetData, SpreadsheetView};
pub use write::{ledger_to_csv, persist_atomically, sheet_to_xlsx, ArtifactFormat};
