pub mod client;
pub mod error;
pub mod normalize;
pub mod parse;
mod retry;
pub mod source;

pub use client::MarketplaceClient;
pub use error::ScraperError;
pub use parse::{parse_listing, Listing};
pub use source::PriceSource;
