//! Serializing the ledger views to bytes and writing artifacts to disk.

use std::io::Write as _;
use std::path::Path;

use repricer_core::{Marker, MarkerPalette};
use rust_xlsxwriter::{Color, Format, FormatPattern, Formula, Workbook, Worksheet};

use crate::catalog::SourceFormat;
use crate::error::LedgerError;
use crate::ledger::Ledger;
use crate::sheet::{CellValue, SpreadsheetView};

/// Output shapes for written artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Csv,
    Xlsx,
}

impl ArtifactFormat {
    /// Picks the format from `path`'s extension.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnsupportedFormat`] for other extensions.
    pub fn from_path(path: &Path) -> Result<Self, LedgerError> {
        let name = path.to_string_lossy();
        SourceFormat::from_filename(&name).map(Self::from)
    }

    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }
}

impl From<SourceFormat> for ArtifactFormat {
    fn from(format: SourceFormat) -> Self {
        match format {
            SourceFormat::Csv => Self::Csv,
            SourceFormat::Xlsx => Self::Xlsx,
        }
    }
}

/// Serializes the ledger as CSV with its original header.
///
/// # Errors
///
/// Returns [`LedgerError::Csv`] if a record cannot be written.
pub fn ledger_to_csv(ledger: &Ledger) -> Result<Vec<u8>, LedgerError> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(Vec::new());
    wtr.write_record(ledger.header())?;
    for row in ledger.rows() {
        wtr.write_record(row)?;
    }
    wtr.into_inner().map_err(|e| LedgerError::Io {
        path: "<memory>".to_owned(),
        source: e.into_error(),
    })
}

/// Serializes the spreadsheet view as an `.xlsx` workbook, filling marked
/// price cells with the palette colour for their marker. The workbook's
/// other worksheets follow in their original order.
///
/// # Errors
///
/// Returns [`LedgerError::XlsxWrite`] if the workbook cannot be built, or
/// [`LedgerError::OutOfBounds`] if a cell falls outside Excel's grid.
pub fn sheet_to_xlsx(
    view: &SpreadsheetView,
    palette: &MarkerPalette,
) -> Result<Vec<u8>, LedgerError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    if !view.sheet_name().is_empty() {
        worksheet.set_name(view.sheet_name())?;
    }

    let (row0, col0) = view.origin();
    let price_col = view.columns().price;
    let updated_fill = solid_fill(palette.updated);
    let unchanged_fill = solid_fill(palette.unchanged);

    for (c, cell) in view.header().iter().enumerate() {
        write_cell(worksheet, pos(row0, 0, col0, c)?, cell, None)?;
    }
    for (r, row) in view.rows().iter().enumerate() {
        let fill = match view.marker(r) {
            Marker::None => None,
            Marker::Unchanged => Some(&unchanged_fill),
            Marker::Updated => Some(&updated_fill),
        };
        for (c, cell) in row.iter().enumerate() {
            let format = if c == price_col { fill } else { None };
            write_cell(worksheet, pos(row0, r + 1, col0, c)?, cell, format)?;
        }
    }

    for sheet in view.other_sheets() {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        let (row0, col0) = sheet.origin;
        for (r, row) in sheet.rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                write_cell(worksheet, pos(row0, r, col0, c)?, cell, None)?;
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Writes `bytes` to `path` through a temporary file in the same directory
/// followed by a rename, so readers never observe a partial artifact.
///
/// # Errors
///
/// Returns [`LedgerError::Io`] if the temporary file cannot be created,
/// written, or moved into place.
pub fn persist_atomically(path: &Path, bytes: &[u8]) -> Result<(), LedgerError> {
    let io_err = |source: std::io::Error| LedgerError::Io {
        path: path.display().to_string(),
        source,
    };
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

pub(crate) fn solid_fill(rgb: u32) -> Format {
    Format::new()
        .set_pattern(FormatPattern::Solid)
        .set_background_color(Color::RGB(rgb))
}

pub(crate) fn pos(
    row0: u32,
    r: usize,
    col0: u32,
    c: usize,
) -> Result<(u32, u16), LedgerError> {
    let out_of_bounds = || LedgerError::OutOfBounds { row: r, col: c };
    let row = u32::try_from(r)
        .ok()
        .and_then(|r| row0.checked_add(r))
        .ok_or_else(out_of_bounds)?;
    let col = u32::try_from(c)
        .ok()
        .and_then(|c| col0.checked_add(c))
        .and_then(|c| u16::try_from(c).ok())
        .ok_or_else(out_of_bounds)?;
    Ok((row, col))
}

pub(crate) fn write_cell(
    worksheet: &mut Worksheet,
    (row, col): (u32, u16),
    cell: &CellValue,
    format: Option<&Format>,
) -> Result<(), LedgerError> {
    match (cell, format) {
        (CellValue::Empty, None) => {}
        (CellValue::Empty, Some(f)) => {
            worksheet.write_blank(row, col, f)?;
        }
        (CellValue::Text(s), None) => {
            worksheet.write_string(row, col, s)?;
        }
        (CellValue::Text(s), Some(f)) => {
            worksheet.write_string_with_format(row, col, s, f)?;
        }
        (CellValue::Number(n), None) => {
            worksheet.write_number(row, col, *n)?;
        }
        (CellValue::Number(n), Some(f)) => {
            worksheet.write_number_with_format(row, col, *n, f)?;
        }
        (CellValue::Bool(b), None) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        (CellValue::Bool(b), Some(f)) => {
            worksheet.write_boolean_with_format(row, col, *b, f)?;
        }
        (CellValue::DateTime(serial), format) => {
            let date_format = format
                .cloned()
                .unwrap_or_else(Format::new)
                .set_num_format(date_pattern(*serial));
            worksheet.write_number_with_format(row, col, *serial, &date_format)?;
        }
        (CellValue::Formula { formula, cached }, None) => {
            worksheet.write_formula(row, col, Formula::new(formula).set_result(cached.to_text()))?;
        }
        (CellValue::Formula { formula, cached }, Some(f)) => {
            let formula = Formula::new(formula).set_result(cached.to_text());
            worksheet.write_formula_with_format(row, col, formula, f)?;
        }
    }
    Ok(())
}

fn date_pattern(serial: f64) -> &'static str {
    if serial.fract().abs() < f64::EPSILON {
        "yyyy-mm-dd"
    } else {
        "yyyy-mm-dd hh:mm:ss"
    }
}

#[cfg(test)]
#[path = "write_test.rs"]
mod tests;
