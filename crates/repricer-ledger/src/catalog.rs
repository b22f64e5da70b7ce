//! Loading uploaded catalogs into a [`Ledger`] (and, for workbooks, a
//! [`SpreadsheetView`]).
//!
//! The catalog is read from a workbook's first worksheet. Every other
//! worksheet is kept alongside it so the output workbook still has it.

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use repricer_core::{CatalogRecord, ColumnNames};

use crate::columns::ColumnMap;
use crate::error::LedgerError;
use crate::ledger::Ledger;
use crate::sheet::{CellValue, SheetData, SpreadsheetView};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Input file shapes the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Xlsx,
}

impl SourceFormat {
    /// Detects the format from a file name's extension (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnsupportedFormat`] for anything but `.csv`
    /// and `.xlsx`.
    pub fn from_filename(filename: &str) -> Result<Self, LedgerError> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("xlsx") => Ok(Self::Xlsx),
            _ => Err(LedgerError::UnsupportedFormat {
                filename: filename.to_owned(),
            }),
        }
    }

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }
}

/// A loaded catalog, ready for a reconciliation run.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub format: SourceFormat,
    /// Immutable "before" snapshot, one entry per data row in file order.
    pub records: Vec<CatalogRecord>,
    pub ledger: Ledger,
    /// Present only for workbook uploads.
    pub sheet: Option<SpreadsheetView>,
}

/// Parses catalog `bytes`, choosing the reader from `filename`'s extension.
///
/// # Errors
///
/// Structural problems (unsupported extension, unreadable file, missing
/// header, missing identifier/price column) are returned before any row is
/// processed; see [`LedgerError::is_structural`].
pub fn load_catalog(
    filename: &str,
    bytes: &[u8],
    names: &ColumnNames,
) -> Result<Catalog, LedgerError> {
    let format = SourceFormat::from_filename(filename)?;
    let (ledger, sheet) = match format {
        SourceFormat::Csv => (load_csv(bytes, names)?, None),
        SourceFormat::Xlsx => {
            let sheet = load_xlsx(bytes, names)?;
            (ledger_from_sheet(&sheet), Some(sheet))
        }
    };

    tracing::info!(
        filename,
        rows = ledger.len(),
        spreadsheet = sheet.is_some(),
        "catalog loaded"
    );

    Ok(Catalog {
        format,
        records: ledger.records(),
        ledger,
        sheet,
    })
}

/// Reads a catalog from disk; see [`load_catalog`].
///
/// # Errors
///
/// Returns [`LedgerError::Io`] if the file cannot be read, otherwise the
/// same errors as [`load_catalog`].
pub fn load_catalog_file(path: &Path, names: &ColumnNames) -> Result<Catalog, LedgerError> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    // Reject the extension before touching the file system.
    SourceFormat::from_filename(filename)?;
    let bytes = std::fs::read(path).map_err(|e| LedgerError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_catalog(filename, &bytes, names)
}

fn load_csv(bytes: &[u8], names: &ColumnNames) -> Result<Ledger, LedgerError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let header: Vec<String> = rdr.headers()?.iter().map(str::to_owned).collect();
    if header.iter().all(|h| h.trim().is_empty()) {
        return Err(LedgerError::MissingHeader);
    }
    let columns = ColumnMap::resolve(&header, names)?;

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_owned).collect());
    }

    Ok(Ledger::new(header, rows, columns))
}

fn load_xlsx(bytes: &[u8], names: &ColumnNames) -> Result<SpreadsheetView, LedgerError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;
    let sheet_names = workbook.sheet_names();
    let (first, rest) = sheet_names.split_first().ok_or(LedgerError::NoWorksheet)?;

    let primary = read_sheet(&mut workbook, first)?;
    let mut rows = primary.rows.into_iter();
    let header = rows.next().ok_or(LedgerError::MissingHeader)?;
    let header_text: Vec<String> = header.iter().map(CellValue::to_text).collect();
    let columns = ColumnMap::resolve(&header_text, names)?;

    let mut other_sheets = Vec::with_capacity(rest.len());
    for name in rest {
        match read_sheet(&mut workbook, name) {
            Ok(sheet) => other_sheets.push(sheet),
            Err(e) => {
                tracing::warn!(sheet = %name, error = %e, "sheet not carried into the output");
            }
        }
    }

    Ok(SpreadsheetView::new(
        primary.name,
        primary.origin,
        header,
        rows.collect(),
        columns,
    )
    .with_other_sheets(other_sheets))
}

/// Reads one worksheet's values, pairing formula cells with their cached
/// result.
fn read_sheet<RS: Read + Seek>(
    workbook: &mut Xlsx<RS>,
    name: &str,
) -> Result<SheetData, LedgerError> {
    let range = workbook.worksheet_range(name)?;
    let formulas = workbook.worksheet_formula(name).ok();
    let origin = range.start().unwrap_or((0, 0));

    let rows = range
        .rows()
        .enumerate()
        .map(|(r, row)| {
            row.iter()
                .enumerate()
                .map(|(c, data)| {
                    let value = cell_from_data(data);
                    let at = (offset(origin.0, r), offset(origin.1, c));
                    match formulas
                        .as_ref()
                        .and_then(|f| f.get_value(at))
                        .filter(|f| !f.is_empty())
                    {
                        Some(formula) => CellValue::Formula {
                            formula: formula.clone(),
                            cached: Box::new(value),
                        },
                        None => value,
                    }
                })
                .collect()
        })
        .collect();

    Ok(SheetData {
        name: name.to_owned(),
        origin,
        rows,
    })
}

fn offset(origin: u32, by: usize) -> u32 {
    u32::try_from(by)
        .ok()
        .and_then(|by| origin.checked_add(by))
        .unwrap_or(u32::MAX)
}

fn ledger_from_sheet(sheet: &SpreadsheetView) -> Ledger {
    let header = sheet.header().iter().map(CellValue::to_text).collect();
    let rows = sheet
        .rows()
        .iter()
        .map(|row| row.iter().map(CellValue::to_text).collect())
        .collect();
    Ledger::new(header, rows, sheet.columns())
}

#[allow(clippy::cast_precision_loss)]
fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) if dt.is_datetime() => CellValue::DateTime(dt.as_f64()),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        other => CellValue::Text(other.to_string()),
    }
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
