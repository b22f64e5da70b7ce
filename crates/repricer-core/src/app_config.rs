use std::net::SocketAddr;
use std::path::PathBuf;

use rust_decimal::Decimal;

use crate::types::MarkerPalette;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Header names used to locate the identifier and price columns of a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    pub identifier: String,
    pub price: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            identifier: "Attribute 1 value(s)".to_owned(),
            price: "Regular price".to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub marketplace_base_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub max_concurrent_fetches: usize,
    pub inter_request_delay_ms: u64,
    /// Fixed amount subtracted from the observed marketplace price.
    pub markdown: Decimal,
    pub columns: ColumnNames,
    pub palette: MarkerPalette,
    /// Directory the server writes comparison reports into.
    pub report_dir: PathBuf,
    pub max_upload_bytes: usize,
}
