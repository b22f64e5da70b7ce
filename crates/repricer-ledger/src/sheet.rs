//! Typed spreadsheet view with per-row change markers.
//!
//! Cell values, dates and formulas survive a load and save. Cell styles,
//! number formats other than dates, column widths, merged ranges, charts
//! and images are not read, so they are not written back.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use repricer_core::{Marker, Price};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::columns::ColumnMap;

/// A worksheet cell as read from the uploaded workbook.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// An Excel date serial (days since 1899-12-30, fraction is time of day).
    DateTime(f64),
    /// A formula with the value Excel last computed for it.
    Formula {
        formula: String,
        cached: Box<CellValue>,
    },
}

impl CellValue {
    /// Renders the cell the way it should appear in text output; numbers
    /// lose insignificant trailing zeros (`95.0` → `"95"`).
    #[must_use]
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    fn from_price(price: Decimal) -> Self {
        price
            .to_f64()
            .map_or_else(|| Self::Text(price.normalize().to_string()), Self::Number)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => match Decimal::from_f64(*n) {
                Some(d) => write!(f, "{}", d.normalize()),
                None => write!(f, "{n}"),
            },
            Self::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Self::DateTime(serial) => match excel_serial_to_datetime(*serial) {
                Some(dt) if dt.time() == NaiveTime::MIN => write!(f, "{}", dt.format("%Y-%m-%d")),
                Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
                None => write!(f, "{serial}"),
            },
            Self::Formula { cached, .. } => write!(f, "{cached}"),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_time(NaiveTime::MIN);
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}

/// A worksheet carried through a run untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetData {
    pub name: String,
    /// Zero-based (row, col) of the first stored cell.
    pub origin: (u32, u32),
    pub rows: Vec<Vec<CellValue>>,
}

/// The worksheet an `.xlsx` catalog was read from.
///
/// Rows are addressed through the same [`ColumnMap`] as the [`crate::Ledger`],
/// and each data row carries the [`Marker`] for its price cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadsheetView {
    sheet_name: String,
    /// Zero-based (row, col) of the header's first cell in the original sheet.
    origin: (u32, u32),
    header: Vec<CellValue>,
    rows: Vec<Vec<CellValue>>,
    markers: Vec<Marker>,
    columns: ColumnMap,
    /// The workbook's other worksheets, in their original order.
    other_sheets: Vec<SheetData>,
}

impl SpreadsheetView {
    #[must_use]
    pub fn new(
        sheet_name: String,
        origin: (u32, u32),
        header: Vec<CellValue>,
        mut rows: Vec<Vec<CellValue>>,
        columns: ColumnMap,
    ) -> Self {
        let width = columns.identifier.max(columns.price) + 1;
        for row in &mut rows {
            if row.len() < width {
                row.resize(width, CellValue::Empty);
            }
        }
        let markers = vec![Marker::None; rows.len()];
        Self {
            sheet_name,
            origin,
            header,
            rows,
            markers,
            columns,
            other_sheets: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_other_sheets(mut self, sheets: Vec<SheetData>) -> Self {
        self.other_sheets = sheets;
        self
    }

    #[must_use]
    pub fn other_sheets(&self) -> &[SheetData] {
        &self.other_sheets
    }

    #[must_use]
    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    #[must_use]
    pub fn origin(&self) -> (u32, u32) {
        self.origin
    }

    #[must_use]
    pub fn header(&self) -> &[CellValue] {
        &self.header
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    #[must_use]
    pub fn columns(&self) -> ColumnMap {
        self.columns
    }

    #[must_use]
    pub fn marker(&self, idx: usize) -> Marker {
        self.markers[idx]
    }

    #[must_use]
    pub fn price(&self, idx: usize) -> Price {
        Price::parse(&self.rows[idx][self.columns.price].to_text())
    }

    fn matches(&self, idx: usize, identifier: &str) -> bool {
        self.rows[idx][self.columns.identifier].to_text().trim() == identifier
    }

    /// Marks the price cell of every row matching `identifier`, writing
    /// `new_price` into it first when given. A weaker marker never replaces a
    /// stronger one. Returns the number of matching rows (zero is not an
    /// error).
    pub fn mark(&mut self, identifier: &str, marker: Marker, new_price: Option<Decimal>) -> usize {
        let mut touched = 0;
        for idx in 0..self.rows.len() {
            if !self.matches(idx, identifier) {
                continue;
            }
            if let Some(price) = new_price {
                self.rows[idx][self.columns.price] = CellValue::from_price(price);
            }
            self.markers[idx] = self.markers[idx].max(marker);
            touched += 1;
        }
        touched
    }
}
