//! HTTP client for marketplace product pages.

use std::time::Duration;

use repricer_core::{AppConfig, ScrapeResult};
use reqwest::Client;

use crate::error::ScraperError;
use crate::parse::parse_listing;
use crate::retry::retry_with_backoff;

/// Fetches one product page per identifier and extracts its title and price.
///
/// Transient errors (timeouts, connection failures, 429, 5xx) are retried
/// with jittered exponential back-off up to `max_retries` additional
/// attempts. 404 and other 4xx responses fail immediately.
pub struct MarketplaceClient {
    client: Client,
    base_url: reqwest::Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl MarketplaceClient {
    /// Creates a client with the given timeout, `User-Agent`, and retry policy.
    ///
    /// `base_url` is the marketplace origin, e.g. `https://www.amazon.in`;
    /// product pages are requested at `{base_url}/dp/{identifier}`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] if `base_url` is not an
    /// absolute http(s) URL, or [`ScraperError::Http`] if the underlying
    /// `reqwest::Client` cannot be constructed.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ScraperError> {
        let invalid = |reason: String| ScraperError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason,
        };
        let parsed = reqwest::Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| invalid(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme \"{}\"", parsed.scheme())));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: parsed,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Builds a client from the marketplace settings in [`AppConfig`].
    ///
    /// # Errors
    ///
    /// See [`MarketplaceClient::new`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Self::new(
            &config.marketplace_base_url,
            config.request_timeout_secs,
            &config.user_agent,
            config.max_retries,
            config.retry_backoff_base_ms,
        )
    }

    /// Fetches the product page for `identifier` and extracts a [`ScrapeResult`].
    ///
    /// Missing title or price anchors are reported as sentinels inside the
    /// result; only an unreachable page is an error.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidIdentifier`]: empty or URL-unsafe identifier (no request made).
    /// - [`ScraperError::NotFound`]: HTTP 404 (not retried).
    /// - [`ScraperError::UnexpectedStatus`]: any other non-2xx status after retries.
    /// - [`ScraperError::RateLimited`]: HTTP 429 after all retries exhausted.
    /// - [`ScraperError::Http`]: timeout, DNS or TLS failure after all retries exhausted.
    pub async fn scrape(&self, identifier: &str) -> Result<ScrapeResult, ScraperError> {
        let identifier = identifier.trim();
        let url = self.product_url(identifier)?;

        tracing::debug!(identifier, %url, "fetching product page");
        let html = self.fetch_page(&url).await?;
        let listing = parse_listing(&html);

        if listing.title.is_none() {
            tracing::warn!(identifier, %url, "title anchor not found; recording NA");
        }
        if !listing.price.is_amount() {
            tracing::warn!(
                identifier,
                %url,
                price = %listing.price,
                "no numeric price on page"
            );
        }

        Ok(ScrapeResult {
            identifier: identifier.to_owned(),
            title: listing.title,
            observed_price: listing.price,
        })
    }

    /// GETs `url` with browser-like headers and returns the body text,
    /// retrying transient failures.
    async fn fetch_page(&self, url: &str) -> Result<String, ScraperError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let response = self
                .client
                .get(url)
                .header(
                    reqwest::header::ACCEPT,
                    "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
                )
                .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
                .send()
                .await?;
            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.trim().parse::<u64>().ok())
                    .unwrap_or(5);
                return Err(ScraperError::RateLimited { retry_after_secs });
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(ScraperError::NotFound {
                    url: url.to_owned(),
                });
            }

            if !status.is_success() {
                return Err(ScraperError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_owned(),
                });
            }

            Ok(response.text().await?)
        })
        .await
    }

    /// Builds the canonical lookup URL for `identifier`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidIdentifier`] if the identifier is empty
    /// or contains characters that would change the URL's shape.
    fn product_url(&self, identifier: &str) -> Result<String, ScraperError> {
        let reject = |reason: &str| ScraperError::InvalidIdentifier {
            identifier: identifier.to_owned(),
            reason: reason.to_owned(),
        };

        if identifier.is_empty() {
            return Err(reject("identifier is empty"));
        }
        if identifier
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '%'))
        {
            return Err(reject("identifier contains URL-reserved characters"));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| reject("marketplace base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(["dp", identifier]);
        Ok(url.to_string())
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
