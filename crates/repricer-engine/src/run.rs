//! The run state machine and its processing loop.
//!
//! A run moves strictly forward through [`RunPhase`]. Fetches may overlap up
//! to the configured concurrency, but results are consumed in catalog order
//! and every mutation is applied from this single loop, so two occurrences
//! of the same identifier can never race on a row.

use std::fmt;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use repricer_core::{decide, AppConfig, ColumnNames, Outcome, Price, ReportRow, ScrapeResult};
use repricer_ledger::{apply, load_catalog, Catalog};
use repricer_scraper::{PriceSource, ScraperError};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tokio::time::{Interval, MissedTickBehavior};

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunPhase {
    Loaded,
    Processing,
    Serialized,
    Delivered,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunPhase::Loaded => "loaded",
            RunPhase::Processing => "processing",
            RunPhase::Serialized => "serialized",
            RunPhase::Delivered => "delivered",
        };
        f.write_str(label)
    }
}

/// Knobs for the processing phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub markdown: Decimal,
    /// Maximum number of page fetches in flight. Values below 1 act as 1.
    pub concurrency: usize,
    /// Minimum spacing between the start of two consecutive fetches.
    pub inter_request_delay_ms: u64,
}

impl RunSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            markdown: config.markdown,
            concurrency: config.max_concurrent_fetches,
            inter_request_delay_ms: config.inter_request_delay_ms,
        }
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            markdown: Decimal::TEN,
            concurrency: 1,
            inter_request_delay_ms: 0,
        }
    }
}

/// Per-status row counts for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub indeterminate: usize,
    pub fetch_failed: usize,
    /// Ledger rows whose price was rewritten. Can exceed `updated` when an
    /// identifier appears more than once.
    pub ledger_rows_rewritten: usize,
}

impl RunSummary {
    fn record(&mut self, status: Outcome) {
        self.total += 1;
        match status {
            Outcome::Updated => self.updated += 1,
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Indeterminate => self.indeterminate += 1,
            Outcome::FetchFailed => self.fetch_failed += 1,
        }
    }
}

/// One reconciliation run over one catalog.
#[derive(Debug)]
pub struct ReconcileRun {
    catalog: Catalog,
    report: Vec<ReportRow>,
    summary: RunSummary,
    phase: RunPhase,
}

impl ReconcileRun {
    /// Starts a run from an already loaded catalog.
    #[must_use]
    pub fn from_catalog(catalog: Catalog) -> Self {
        tracing::info!(rows = catalog.records.len(), phase = %RunPhase::Loaded, "run phase");
        Self {
            report: Vec::with_capacity(catalog.records.len()),
            catalog,
            summary: RunSummary::default(),
            phase: RunPhase::Loaded,
        }
    }

    /// Parses an uploaded catalog and starts a run from it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Catalog`] if the upload cannot be loaded; no
    /// identifier has been processed at that point.
    pub fn load(filename: &str, bytes: &[u8], names: &ColumnNames) -> Result<Self, EngineError> {
        let catalog = load_catalog(filename, bytes, names).map_err(EngineError::Catalog)?;
        Ok(Self::from_catalog(catalog))
    }

    #[must_use]
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn report(&self) -> &[ReportRow] {
        &self.report
    }

    #[must_use]
    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    pub(crate) fn expect_phase(&self, expected: RunPhase) -> Result<(), EngineError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(EngineError::Phase {
                expected,
                actual: self.phase,
            })
        }
    }

    pub(crate) fn advance(&mut self, next: RunPhase) {
        tracing::info!(from = %self.phase, to = %next, "run phase");
        self.phase = next;
    }

    /// Marks the rendered artifacts as handed to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Phase`] unless the run has been serialized.
    pub fn mark_delivered(&mut self) -> Result<(), EngineError> {
        self.expect_phase(RunPhase::Serialized)?;
        self.advance(RunPhase::Delivered);
        Ok(())
    }

    /// Fetches, decides, and mutates every catalog row in order.
    ///
    /// Failed fetches become [`Outcome::FetchFailed`] report rows and leave
    /// the ledger untouched; they never abort the run.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Phase`] if the run was already processed.
    pub async fn process<S: PriceSource>(
        &mut self,
        source: &S,
        settings: &RunSettings,
    ) -> Result<(), EngineError> {
        self.expect_phase(RunPhase::Loaded)?;
        self.advance(RunPhase::Processing);

        let pacer = Pacer::new(settings.inter_request_delay_ms);
        let concurrency = settings.concurrency.max(1);
        let markdown = settings.markdown;

        let Self {
            catalog,
            report,
            summary,
            ..
        } = self;

        // The stream owns its items so the fetch futures hold no borrow of
        // the catalog, which the loop below mutates.
        let identifiers: Vec<(usize, String)> = catalog
            .records
            .iter()
            .map(|r| r.identifier.clone())
            .enumerate()
            .collect();
        let pacer = &pacer;
        let mut fetches = stream::iter(identifiers)
            .map(|(idx, identifier)| fetch_one(source, pacer, idx, identifier))
            .buffered(concurrency);

        while let Some((idx, fetched)) = fetches.next().await {
            let record = &catalog.records[idx];
            let row = match fetched {
                Ok(scrape) => {
                    if let Price::Invalid(raw) = &scrape.observed_price {
                        tracing::warn!(
                            identifier = %record.identifier,
                            raw = %raw,
                            "could not convert observed price to a number"
                        );
                    }
                    if let Price::Invalid(raw) = &record.local_price {
                        tracing::warn!(
                            identifier = %record.identifier,
                            raw = %raw,
                            "could not convert catalog price to a number"
                        );
                    }

                    let outcome = decide(
                        &record.identifier,
                        &record.local_price,
                        &scrape.observed_price,
                        markdown,
                    );
                    let effect = apply(&outcome, &mut catalog.ledger, catalog.sheet.as_mut());
                    summary.ledger_rows_rewritten += effect.ledger_rows;

                    tracing::debug!(
                        identifier = %record.identifier,
                        status = %outcome.outcome(),
                        ledger_rows = effect.ledger_rows,
                        "identifier reconciled"
                    );
                    ReportRow::reconciled(record, &scrape, &outcome)
                }
                Err(e) => {
                    tracing::warn!(
                        identifier = %record.identifier,
                        error = %e,
                        "fetch failed; leaving catalog price untouched"
                    );
                    ReportRow::fetch_failed(record)
                }
            };
            summary.record(row.status);
            report.push(row);
        }

        tracing::info!(
            total = summary.total,
            updated = summary.updated,
            unchanged = summary.unchanged,
            indeterminate = summary.indeterminate,
            fetch_failed = summary.fetch_failed,
            "processing complete"
        );
        Ok(())
    }
}

async fn fetch_one<S: PriceSource>(
    source: &S,
    pacer: &Pacer,
    idx: usize,
    identifier: String,
) -> (usize, Result<ScrapeResult, ScraperError>) {
    pacer.wait().await;
    (idx, source.extract(&identifier).await)
}

/// Runs the processing phase over an already loaded `catalog` and returns
/// the run ready for serialization.
pub async fn reconcile<S: PriceSource>(
    source: &S,
    catalog: Catalog,
    settings: &RunSettings,
) -> ReconcileRun {
    let mut run = ReconcileRun::from_catalog(catalog);
    // A freshly created run is always in the Loaded phase.
    if let Err(e) = run.process(source, settings).await {
        tracing::error!(error = %e, "reconcile run did not process");
    }
    run
}

/// Spaces out fetch starts by a fixed minimum interval.
struct Pacer(Option<Mutex<Interval>>);

impl Pacer {
    fn new(delay_ms: u64) -> Self {
        if delay_ms == 0 {
            return Self(None);
        }
        let mut interval = tokio::time::interval(Duration::from_millis(delay_ms));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self(Some(Mutex::new(interval)))
    }

    async fn wait(&self) {
        if let Some(interval) = &self.0 {
            interval.lock().await.tick().await;
        }
    }
}

#[cfg(test)]
#[path = "run_test.rs"]
mod tests;
