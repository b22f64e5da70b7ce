use repricer_core::ColumnNames;

use crate::error::LedgerError;

/// Positions of the identifier and price columns, resolved once from the
/// header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub identifier: usize,
    pub price: usize,
}

impl ColumnMap {
    /// Resolves `names` against a header row. Header cells are compared after
    /// trimming; the first matching column wins.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::MissingColumn`] naming the first column that
    /// is absent.
    pub fn resolve<S: AsRef<str>>(header: &[S], names: &ColumnNames) -> Result<Self, LedgerError> {
        let find = |wanted: &str| {
            header
                .iter()
                .position(|h| h.as_ref().trim() == wanted)
                .ok_or_else(|| LedgerError::MissingColumn {
                    column: wanted.to_owned(),
                })
        };

        Ok(Self {
            identifier: find(&names.identifier)?,
            price: find(&names.price)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> ColumnNames {
        ColumnNames {
            identifier: "ASIN".to_owned(),
            price: "Regular price".to_owned(),
        }
    }

    #[test]
    fn resolves_columns_by_name_regardless_of_position() {
        let header = ["ID", "Name", " Regular price ", "SKU", "ASIN"];
        let map = ColumnMap::resolve(&header, &names()).unwrap();
        assert_eq!(map, ColumnMap { identifier: 4, price: 2 });
    }

    #[test]
    fn missing_price_column_is_reported_by_name() {
        let header = ["ASIN", "Sale price"];
        let err = ColumnMap::resolve(&header, &names()).unwrap_err();
        assert!(
            matches!(err, LedgerError::MissingColumn { ref column } if column == "Regular price"),
            "got: {err:?}"
        );
        assert!(err.is_structural());
    }

    #[test]
    fn missing_identifier_column_is_reported_first() {
        let header: [&str; 0] = [];
        let err = ColumnMap::resolve(&header, &names()).unwrap_err();
        assert!(matches!(err, LedgerError::MissingColumn { ref column } if column == "ASIN"));
    }
}
