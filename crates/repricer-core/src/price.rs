//! Tagged price values.
//!
//! Catalog cells and scraped page text both arrive as free-form strings. A
//! [`Price`] makes the "is this a number?" question explicit so that only
//! two [`Price::Amount`] values can ever be compared.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

/// Literal written in place of a price (or title) that was looked for but
/// not found.
pub const NOT_AVAILABLE: &str = "NA";

/// A price cell or scraped price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Price {
    /// A numeric amount in the catalog's currency.
    Amount(Decimal),
    /// The field was looked for but is absent (blank cell or `"NA"`).
    NotAvailable,
    /// Text was present but is not a number, e.g. `"call us"`.
    Invalid(String),
}

impl Price {
    /// Parses free-form price text.
    ///
    /// Surrounding whitespace is ignored. Blank text and `"NA"` (any case)
    /// become [`Price::NotAvailable`]; anything else that does not parse as a
    /// decimal is kept verbatim as [`Price::Invalid`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NOT_AVAILABLE) {
            return Self::NotAvailable;
        }
        match Decimal::from_str(trimmed) {
            Ok(value) => Self::Amount(value),
            Err(_) => Self::Invalid(trimmed.to_owned()),
        }
    }

    /// Returns the numeric amount, if this price has one.
    #[must_use]
    pub fn amount(&self) -> Option<Decimal> {
        match self {
            Self::Amount(value) => Some(*value),
            Self::NotAvailable | Self::Invalid(_) => None,
        }
    }

    #[must_use]
    pub fn is_amount(&self) -> bool {
        matches!(self, Self::Amount(_))
    }
}

impl From<Decimal> for Price {
    fn from(value: Decimal) -> Self {
        Self::Amount(value)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Amount(value) => write!(f, "{}", value.normalize()),
            Self::NotAvailable => f.write_str(NOT_AVAILABLE),
            Self::Invalid(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
