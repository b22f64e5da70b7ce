//! Text clean-up for values lifted out of product pages.

/// Currency glyphs stripped from scraped price text.
const CURRENCY_GLYPHS: &[char] = &['₹', '$', '€', '£', '¥'];

/// Normalizes scraped price text into something [`repricer_core::Price::parse`]
/// understands.
///
/// Removes thousands separators and currency glyphs, trims whitespace
/// (including non-breaking spaces), and drops a dangling decimal point left
/// behind by a "whole units" fragment such as `"1,299."`.
#[must_use]
pub fn normalize_price_text(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',' && !CURRENCY_GLYPHS.contains(c))
        .collect();
    cleaned.trim().trim_end_matches('.').trim().to_string()
}

/// Normalizes a product title for tabular output: trimmed, commas removed,
/// inner whitespace runs collapsed to one space.
#[must_use]
pub fn normalize_title(raw: &str) -> String {
    raw.replace(',', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
