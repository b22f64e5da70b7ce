//! Drives a reconciliation run: load a catalog, fetch every identifier's
//! marketplace price, apply the markdown rule, and render the updated ledger
//! plus a comparison report.

pub mod artifacts;
pub mod error;
pub mod run;

pub use artifacts::RenderedArtifacts;
pub use error::EngineError;
pub use run::{reconcile, ReconcileRun, RunPhase, RunSettings, RunSummary};
