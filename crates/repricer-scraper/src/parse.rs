//! Title and price extraction from a marketplace product page.
//!
//! The page is parsed into a DOM with `scraper` and two anchors are looked
//! up independently: the title span and the price block. The price block
//! has two known inner shapes, tried in order:
//!
//! 1. `span.a-offscreen`, the screen-reader copy, e.g. `"₹1,299.00"`.
//! 2. `span.a-price-whole`, the visible whole-units fragment, e.g. `"1,299."`.
//!
//! A missing anchor yields a sentinel, never an error.

use std::sync::LazyLock;

use repricer_core::Price;
use scraper::{ElementRef, Html, Selector};

use crate::normalize::{normalize_price_text, normalize_title};

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span#productTitle").expect("valid title selector"));

static PRICE_BLOCK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("span#tp_price_block_total_price_ww").expect("valid price block selector")
});

static PRICE_FORMS: LazyLock<[Selector; 2]> = LazyLock::new(|| {
    [
        Selector::parse("span.a-offscreen").expect("valid offscreen selector"),
        Selector::parse("span.a-price-whole").expect("valid whole-price selector"),
    ]
});

/// Fields lifted from one product page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// `None` when the title anchor is missing or empty.
    pub title: Option<String>,
    /// [`Price::NotAvailable`] when no price anchor resolves.
    pub price: Price,
}

/// Extracts the title and price from raw page HTML.
#[must_use]
pub fn parse_listing(html: &str) -> Listing {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE)
        .next()
        .map(|el| normalize_title(&element_text(el)))
        .filter(|t| !t.is_empty());

    let price = document
        .select(&PRICE_BLOCK)
        .next()
        .and_then(|block| PRICE_FORMS.iter().find_map(|form| block.select(form).next()))
        .map_or(Price::NotAvailable, |node| {
            Price::parse(&normalize_price_text(&element_text(node)))
        });

    Listing { title, price }
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
