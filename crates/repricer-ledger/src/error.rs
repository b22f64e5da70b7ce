use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("unsupported file \"{filename}\": only CSV and Excel (.xlsx) files are supported")]
    UnsupportedFormat { filename: String },

    #[error("required column \"{column}\" not found in catalog header")]
    MissingColumn { column: String },

    #[error("catalog has no header row")]
    MissingHeader,

    #[error("workbook has no worksheets")]
    NoWorksheet,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read workbook: {0}")]
    XlsxRead(#[from] calamine::XlsxError),

    #[error("failed to write workbook: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("cell at row {row}, column {col} is outside worksheet bounds")]
    OutOfBounds { row: usize, col: usize },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl LedgerError {
    /// `true` when the error describes a bad input file rather than a
    /// failure on our side. Structural errors abort a run before any
    /// identifier is processed.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat { .. }
                | Self::MissingColumn { .. }
                | Self::MissingHeader
                | Self::NoWorksheet
                | Self::Csv(_)
                | Self::XlsxRead(_)
        )
    }
}
