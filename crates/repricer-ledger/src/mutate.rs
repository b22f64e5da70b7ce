use repricer_core::{Marker, ReconciliationOutcome};

use crate::ledger::Ledger;
use crate::sheet::SpreadsheetView;

/// How many rows a single [`apply`] call touched in each view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationEffect {
    pub ledger_rows: usize,
    /// `None` when the catalog has no spreadsheet view.
    pub sheet_rows: Option<usize>,
}

/// Applies one reconciliation outcome to the ledger and, when present, the
/// spreadsheet view.
///
/// Non-comparable outcomes leave both views untouched. A changed outcome
/// rewrites the price in every matching row of both views; an unchanged one
/// only marks the spreadsheet rows.
pub fn apply(
    outcome: &ReconciliationOutcome,
    ledger: &mut Ledger,
    sheet: Option<&mut SpreadsheetView>,
) -> MutationEffect {
    let has_sheet = sheet.is_some();
    if !outcome.comparable {
        return MutationEffect {
            ledger_rows: 0,
            sheet_rows: has_sheet.then_some(0),
        };
    }

    let id = outcome.identifier.as_str();
    let (ledger_rows, new_price) = match outcome.target_price {
        Some(target) if outcome.changed => (ledger.set_price(id, target), Some(target)),
        _ => (0, None),
    };

    let sheet_rows = sheet.map(|view| {
        let marker = if new_price.is_some() {
            Marker::Updated
        } else {
            Marker::Unchanged
        };
        let touched = view.mark(id, marker, new_price);
        if touched == 0 {
            tracing::debug!(identifier = id, "no matching row in spreadsheet view");
        }
        touched
    });

    MutationEffect {
        ledger_rows,
        sheet_rows,
    }
}
