use repricer_ledger::LedgerError;
use thiserror::Error;

use crate::run::RunPhase;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to load catalog: {0}")]
    Catalog(#[source] LedgerError),

    #[error("failed to produce {artifact}: {source}")]
    Artifact {
        artifact: &'static str,
        #[source]
        source: LedgerError,
    },

    #[error("{artifact} was not rendered: {reason}")]
    Unrendered {
        artifact: &'static str,
        reason: String,
    },

    #[error("run is in phase {actual}, expected {expected}")]
    Phase { expected: RunPhase, actual: RunPhase },
}

impl EngineError {
    /// `true` when the uploaded catalog itself is unusable (bad extension,
    /// unreadable contents, missing header or column). Callers report these
    /// as client errors.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Catalog(e) if e.is_structural())
    }
}
