use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by marketplace (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("product page not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid identifier \"{identifier}\": {reason}")]
    InvalidIdentifier { identifier: String, reason: String },

    #[error("invalid marketplace base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}
