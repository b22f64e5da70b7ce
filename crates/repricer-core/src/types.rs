use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::decision::ReconciliationOutcome;
use crate::price::{Price, NOT_AVAILABLE};

/// One product row of the uploaded catalog, as it was before the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogRecord {
    /// Marketplace key, e.g. an ASIN such as `"B0C1234XYZ"`.
    pub identifier: String,
    pub local_price: Price,
}

/// What the extractor found on a reachable product page.
///
/// A missing field is a sentinel (`None` title, [`Price::NotAvailable`]
/// price), not an error. Unreachable pages never produce a `ScrapeResult`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeResult {
    pub identifier: String,
    pub title: Option<String>,
    pub observed_price: Price,
}

impl ScrapeResult {
    /// Title as written to reports: the scraped text or `"NA"`.
    #[must_use]
    pub fn title_or_na(&self) -> &str {
        self.title.as_deref().unwrap_or(NOT_AVAILABLE)
    }
}

/// Report status for one processed catalog row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Updated,
    Unchanged,
    /// Page fetched but one of the prices was not a number.
    Indeterminate,
    /// The page could not be fetched at all.
    FetchFailed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Outcome::Updated => "updated",
            Outcome::Unchanged => "unchanged",
            Outcome::Indeterminate => "indeterminate",
            Outcome::FetchFailed => "fetch_failed",
        };
        f.write_str(label)
    }
}

/// Annotation on a spreadsheet price cell.
///
/// Ordered by strength: a row marked `Updated` earlier in a run is not
/// downgraded to `Unchanged` by a later duplicate of the same identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    #[default]
    None,
    Unchanged,
    Updated,
}

/// Fill colours (`0xRRGGBB`) applied to marked price cells on export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerPalette {
    pub updated: u32,
    pub unchanged: u32,
}

impl MarkerPalette {
    /// Returns the fill colour for `marker`, or `None` for unmarked cells.
    #[must_use]
    pub fn fill_for(&self, marker: Marker) -> Option<u32> {
        match marker {
            Marker::None => None,
            Marker::Unchanged => Some(self.unchanged),
            Marker::Updated => Some(self.updated),
        }
    }
}

impl Default for MarkerPalette {
    fn default() -> Self {
        Self {
            updated: 0x00_FF_00,
            unchanged: 0xFF_FF_00,
        }
    }
}

/// Parses a hex colour such as `"00FF00"` or `"#ffff00"`.
#[must_use]
pub fn parse_rgb(raw: &str) -> Option<u32> {
    let hex = raw.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

/// One line of the side-by-side comparison report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub identifier: String,
    pub title: String,
    pub observed_price: Price,
    pub prior_price: Price,
    pub target_price: Option<Decimal>,
    pub status: Outcome,
}

impl ReportRow {
    /// Row for an identifier whose page was fetched and reconciled.
    #[must_use]
    pub fn reconciled(
        record: &CatalogRecord,
        scrape: &ScrapeResult,
        outcome: &ReconciliationOutcome,
    ) -> Self {
        Self {
            identifier: record.identifier.clone(),
            title: scrape.title_or_na().to_owned(),
            observed_price: scrape.observed_price.clone(),
            prior_price: record.local_price.clone(),
            target_price: outcome.target_price,
            status: outcome.outcome(),
        }
    }

    /// Explicit indeterminate row for an identifier whose fetch failed.
    #[must_use]
    pub fn fetch_failed(record: &CatalogRecord) -> Self {
        Self {
            identifier: record.identifier.clone(),
            title: NOT_AVAILABLE.to_owned(),
            observed_price: Price::NotAvailable,
            prior_price: record.local_price.clone(),
            target_price: None,
            status: Outcome::FetchFailed,
        }
    }
}
