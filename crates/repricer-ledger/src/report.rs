//! The side-by-side comparison report artifact.

use repricer_core::{Price, ReportRow};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Format, Workbook};

use crate::error::LedgerError;
use crate::sheet::CellValue;
use crate::write::{pos, write_cell, ArtifactFormat};

pub const REPORT_HEADERS: [&str; 6] = [
    "Identifier",
    "Title",
    "Observed Price",
    "Prior Price",
    "Target Price",
    "Status",
];

/// Serializes report rows in the requested format.
///
/// # Errors
///
/// Returns the writer's error if serialization fails.
pub fn report_to_bytes(rows: &[ReportRow], format: ArtifactFormat) -> Result<Vec<u8>, LedgerError> {
    match format {
        ArtifactFormat::Csv => report_to_csv(rows),
        ArtifactFormat::Xlsx => report_to_xlsx(rows),
    }
}

/// # Errors
///
/// Returns [`LedgerError::Csv`] if a record cannot be written.
pub fn report_to_csv(rows: &[ReportRow]) -> Result<Vec<u8>, LedgerError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(REPORT_HEADERS)?;
    for row in rows {
        wtr.write_record([
            row.identifier.clone(),
            row.title.clone(),
            row.observed_price.to_string(),
            row.prior_price.to_string(),
            row.target_price
                .map(|p| p.normalize().to_string())
                .unwrap_or_default(),
            row.status.to_string(),
        ])?;
    }
    wtr.into_inner().map_err(|e| LedgerError::Io {
        path: "<memory>".to_owned(),
        source: e.into_error(),
    })
}

/// Writes the report as a single-sheet workbook. Amounts are stored as
/// numbers; sentinels stay as text.
///
/// # Errors
///
/// Returns [`LedgerError::XlsxWrite`] if the workbook cannot be built.
pub fn report_to_xlsx(rows: &[ReportRow]) -> Result<Vec<u8>, LedgerError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Price Comparison")?;
    let bold = Format::new().set_bold();

    for (c, title) in REPORT_HEADERS.iter().enumerate() {
        let (r, c) = pos(0, 0, 0, c)?;
        worksheet.write_string_with_format(r, c, *title, &bold)?;
    }

    for (r, row) in rows.iter().enumerate() {
        let cells = [
            CellValue::Text(row.identifier.clone()),
            CellValue::Text(row.title.clone()),
            price_cell(&row.observed_price),
            price_cell(&row.prior_price),
            row.target_price.map_or(CellValue::Empty, decimal_cell),
            CellValue::Text(row.status.to_string()),
        ];
        for (c, cell) in cells.iter().enumerate() {
            write_cell(worksheet, pos(0, r + 1, 0, c)?, cell, None)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn price_cell(price: &Price) -> CellValue {
    match price {
        Price::Amount(d) => decimal_cell(*d),
        other => CellValue::Text(other.to_string()),
    }
}

fn decimal_cell(value: Decimal) -> CellValue {
    value
        .to_f64()
        .map_or_else(|| CellValue::Text(value.to_string()), CellValue::Number)
}
