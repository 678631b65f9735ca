use crate::types::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Column requested more than once: {0}")]
    DuplicateColumn(String),

    #[error("Imputation error: {0}")]
    Imputation(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TableError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TableError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            TableError::Parse(_) => ErrorKind::Parse,
            TableError::UnknownColumn(_) | TableError::DuplicateColumn(_) => {
                ErrorKind::UnknownColumn
            }
            TableError::Imputation(_) => ErrorKind::Imputation,
            TableError::Export(_) => ErrorKind::Export,
            TableError::Config(_) => ErrorKind::Config,
            TableError::Io(_) => ErrorKind::Process,
        }
    }
}

impl From<csv::Error> for TableError {
    fn from(e: csv::Error) -> Self {
        TableError::Parse(e.to_string())
    }
}

impl From<calamine::XlsxError> for TableError {
    fn from(e: calamine::XlsxError) -> Self {
        TableError::Parse(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for TableError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        TableError::Export(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TableError>;
