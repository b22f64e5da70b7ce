pub mod app_config;
pub mod config;
pub mod decision;
pub mod error;
pub mod price;
pub mod types;

pub use app_config::{AppConfig, ColumnNames, Environment};
pub use config::{load_app_config, load_app_config_from_env, parse_markdown};
pub use decision::{decide, ReconciliationOutcome};
pub use error::ConfigError;
pub use price::{Price, NOT_AVAILABLE};
pub use types::{
    parse_rgb, CatalogRecord, Marker, MarkerPalette, Outcome, ReportRow, ScrapeResult,
};
