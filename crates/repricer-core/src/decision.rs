//! The markdown rule that turns an observed marketplace price into a target
//! local price.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::price::Price;
use crate::types::{Marker, Outcome};

/// Result of comparing one stored price against one observed price.
///
/// `changed` only carries meaning when `comparable` is `true`; callers must
/// check [`ReconciliationOutcome::comparable`] before mutating anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationOutcome {
    pub identifier: String,
    /// `max(observed - markdown, 0)`; `None` when the prices are not comparable.
    pub target_price: Option<Decimal>,
    pub changed: bool,
    pub comparable: bool,
}

impl ReconciliationOutcome {
    /// Classification used for the report's status column.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        match (self.comparable, self.changed) {
            (false, _) => Outcome::Indeterminate,
            (true, true) => Outcome::Updated,
            (true, false) => Outcome::Unchanged,
        }
    }

    /// Visual marker the spreadsheet view should carry for this outcome.
    #[must_use]
    pub fn marker(&self) -> Marker {
        match self.outcome() {
            Outcome::Updated => Marker::Updated,
            Outcome::Unchanged => Marker::Unchanged,
            Outcome::Indeterminate | Outcome::FetchFailed => Marker::None,
        }
    }
}

/// Decides whether the stored price for `identifier` must change.
///
/// Both sides must be [`Price::Amount`] for the outcome to be comparable.
/// Equality is exact decimal equality: `85` and `85.00` are equal, `84.99`
/// and `85` are not.
#[must_use]
pub fn decide(
    identifier: &str,
    stored: &Price,
    observed: &Price,
    markdown: Decimal,
) -> ReconciliationOutcome {
    let (Some(stored), Some(observed)) = (stored.amount(), observed.amount()) else {
        return ReconciliationOutcome {
            identifier: identifier.to_owned(),
            target_price: None,
            changed: false,
            comparable: false,
        };
    };

    let target = (observed - markdown).max(Decimal::ZERO);

    ReconciliationOutcome {
        identifier: identifier.to_owned(),
        target_price: Some(target),
        changed: target != stored,
        comparable: true,
    }
}
