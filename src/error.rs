use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Worksheet '{0}' not found in workbook")]
    MissingSheet(String),

    #[error("Unable to open workbook {path}: {details}")]
    MalformedFile { path: String, details: String },

    #[error("Column '{column}' not found in worksheet '{sheet}'")]
    MissingColumn { sheet: String, column: String },

    #[error("Invalid period key '{0}': expected YY-MM")]
    InvalidPeriod(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IngestError>;

/// Why a single cell could not be read as the requested type.
///
/// These never abort a run: the normalizer substitutes the field default and
/// keeps going.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CellWarning {
    #[error("cell is empty")]
    Empty,

    #[error("cannot read '{0}' as a number")]
    NotNumeric(String),

    #[error("cell holds a spreadsheet error: {0}")]
    ErrorValue(String),
}

/// A tolerated cell failure, located in its sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct CellIssue {
    pub sheet: String,
    /// 1-based worksheet line, header included.
    pub row: usize,
    pub column: String,
    pub warning: CellWarning,
}

impl std::fmt::Display for CellIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}!{} line {}: {}",
            self.sheet, self.column, self.row, self.warning
        )
    }
}
