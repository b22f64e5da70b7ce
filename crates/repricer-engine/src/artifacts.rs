//! Rendering a processed run into its two output artifacts.

use std::path::Path;

use repricer_core::MarkerPalette;
use repricer_ledger::{
    ledger_to_csv, persist_atomically, report_to_bytes, sheet_to_xlsx, ArtifactFormat,
    LedgerError,
};

use crate::error::EngineError;
use crate::run::{ReconcileRun, RunPhase};

/// The two rendered artifacts. Each one succeeds or fails on its own, so a
/// broken report never costs the caller the updated ledger.
#[derive(Debug)]
pub struct RenderedArtifacts {
    pub ledger: Result<Vec<u8>, EngineError>,
    /// `Xlsx` for workbook uploads (with marker fills), `Csv` otherwise.
    pub ledger_format: ArtifactFormat,
    pub report: Result<Vec<u8>, EngineError>,
    pub report_format: ArtifactFormat,
}

impl RenderedArtifacts {
    /// # Errors
    ///
    /// Returns [`EngineError::Unrendered`] if the ledger failed to render, or
    /// [`EngineError::Artifact`] if the file cannot be written.
    pub fn write_ledger(&self, path: &Path) -> Result<(), EngineError> {
        write_artifact("ledger", &self.ledger, path)
    }

    /// # Errors
    ///
    /// Returns [`EngineError::Unrendered`] if the report failed to render, or
    /// [`EngineError::Artifact`] if the file cannot be written.
    pub fn write_report(&self, path: &Path) -> Result<(), EngineError> {
        write_artifact("report", &self.report, path)
    }
}

fn write_artifact(
    artifact: &'static str,
    rendered: &Result<Vec<u8>, EngineError>,
    path: &Path,
) -> Result<(), EngineError> {
    let bytes = rendered.as_ref().map_err(|e| EngineError::Unrendered {
        artifact,
        reason: e.to_string(),
    })?;
    persist_atomically(path, bytes).map_err(|source| EngineError::Artifact { artifact, source })?;
    tracing::info!(artifact, path = %path.display(), "artifact written");
    Ok(())
}

impl ReconcileRun {
    /// Serializes the updated ledger and the comparison report.
    ///
    /// The two artifacts are rendered independently and each carries its own
    /// result. The run moves to the serialized phase once the ledger has
    /// rendered; if it has not, the run stays in processing and may be
    /// rendered again.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Phase`] if the run has not been processed.
    /// Per-artifact failures are inside the returned [`RenderedArtifacts`].
    pub fn render(
        &mut self,
        palette: &MarkerPalette,
        report_format: ArtifactFormat,
    ) -> Result<RenderedArtifacts, EngineError> {
        self.expect_phase(RunPhase::Processing)?;

        let ledger_format = self.ledger_format();
        let ledger = self
            .render_ledger(palette)
            .map_err(|source| EngineError::Artifact {
                artifact: "ledger",
                source,
            });
        let report = report_to_bytes(self.report(), report_format).map_err(|source| {
            EngineError::Artifact {
                artifact: "report",
                source,
            }
        });

        if let Err(e) = &report {
            tracing::error!(error = %e, "report rendering failed");
        }
        match &ledger {
            Ok(_) => self.advance(RunPhase::Serialized),
            Err(e) => tracing::error!(error = %e, "ledger rendering failed"),
        }

        Ok(RenderedArtifacts {
            ledger,
            ledger_format,
            report,
            report_format,
        })
    }

    fn ledger_format(&self) -> ArtifactFormat {
        if self.catalog().sheet.is_some() {
            ArtifactFormat::Xlsx
        } else {
            ArtifactFormat::Csv
        }
    }

    fn render_ledger(&self, palette: &MarkerPalette) -> Result<Vec<u8>, LedgerError> {
        let catalog = self.catalog();
        match &catalog.sheet {
            Some(sheet) => sheet_to_xlsx(sheet, palette),
            None => ledger_to_csv(&catalog.ledger),
        }
    }
}
