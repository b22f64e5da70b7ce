//! The seam between the run orchestrator and whatever produces prices.

use std::future::Future;

use repricer_core::ScrapeResult;

use crate::client::MarketplaceClient;
use crate::error::ScraperError;

/// Something that can look up the current marketplace listing for an
/// identifier.
///
/// `Ok` means the page was reachable (fields may still be sentinels); `Err`
/// means the fetch itself failed and no listing exists.
pub trait PriceSource {
    fn extract(
        &self,
        identifier: &str,
    ) -> impl Future<Output = Result<ScrapeResult, ScraperError>> + Send;
}

impl PriceSource for MarketplaceClient {
    fn extract(
        &self,
        identifier: &str,
    ) -> impl Future<Output = Result<ScrapeResult, ScraperError>> + Send {
        self.scrape(identifier)
    }
}
