/// Fetch a single listing and print what was extracted.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the page cannot be
/// fetched. Missing fields are printed as `NA`, not treated as errors.
pub(crate) async fn run_extract(
    config: &repricer_core::AppConfig,
    identifier: &str,
) -> anyhow::Result<()> {
    let client = repricer_scraper::MarketplaceClient::from_app_config(config)
        .map_err(|e| anyhow::anyhow!("failed to build marketplace client: {e}"))?;

    tracing::debug!(identifier, "fetching listing");
    let listing = client.scrape(identifier).await?;
    tracing::info!(
        identifier,
        price = %listing.observed_price,
        "listing extracted"
    );

    println!("identifier: {}", listing.identifier);
    println!("title:      {}", listing.title_or_na());
    println!("price:      {}", listing.observed_price);
    Ok(())
}
