use repricer_core::{CatalogRecord, Price};
use rust_decimal::Decimal;

use crate::columns::ColumnMap;

/// The canonical, row-oriented catalog table.
///
/// Cells are kept as text exactly as read (spreadsheet numbers are rendered
/// without trailing zeros). Only the price column is ever rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    columns: ColumnMap,
}

impl Ledger {
    /// Builds a ledger, padding short rows to the header width so every row
    /// has an identifier and a price cell.
    #[must_use]
    pub fn new(header: Vec<String>, mut rows: Vec<Vec<String>>, columns: ColumnMap) -> Self {
        let width = header
            .len()
            .max(columns.identifier + 1)
            .max(columns.price + 1);
        for row in &mut rows {
            if row.len() < width {
                row.resize(width, String::new());
            }
        }
        Self {
            header,
            rows,
            columns,
        }
    }

    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    #[must_use]
    pub fn columns(&self) -> ColumnMap {
        self.columns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Trimmed identifier of row `idx`.
    #[must_use]
    pub fn identifier(&self, idx: usize) -> &str {
        self.rows[idx][self.columns.identifier].trim()
    }

    /// Parsed price of row `idx`.
    #[must_use]
    pub fn price(&self, idx: usize) -> Price {
        Price::parse(&self.rows[idx][self.columns.price])
    }

    /// Snapshot of every row as a [`CatalogRecord`], in file order.
    #[must_use]
    pub fn records(&self) -> Vec<CatalogRecord> {
        (0..self.rows.len())
            .map(|idx| CatalogRecord {
                identifier: self.identifier(idx).to_owned(),
                local_price: self.price(idx),
            })
            .collect()
    }

    /// Indices of rows whose identifier equals `identifier` exactly.
    pub fn rows_matching<'a>(&'a self, identifier: &'a str) -> impl Iterator<Item = usize> + 'a {
        (0..self.rows.len()).filter(move |&idx| self.identifier(idx) == identifier)
    }

    /// Writes `price` into every row matching `identifier`; returns how many
    /// rows were touched.
    pub fn set_price(&mut self, identifier: &str, price: Decimal) -> usize {
        let matching: Vec<usize> = self.rows_matching(identifier).collect();
        let text = price.normalize().to_string();
        for &idx in &matching {
            self.rows[idx][self.columns.price].clone_from(&text);
        }
        matching.len()
    }
}
