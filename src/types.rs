use crate::error::{Result, TableError};
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::fmt;

/// Inferred column type codes reported for every loaded column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
#[derive(Default)]
pub enum DataType {
    #[default]
    Text = 0,
    Integer = 1,
    Float = 2,
}

impl DataType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Integer | DataType::Float)
    }
}

/// Error kind codes reported to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum ErrorKind {
    Process = 0,           // Unhandled failure (IO)
    UnsupportedFormat = 1, // Unknown input or output format
    Parse = 2,             // Malformed input bytes
    UnknownColumn = 3,     // Column selection references a missing column
    Imputation = 4,        // Mean undefined for an all-missing column
    Export = 5,            // Table could not be serialized
    Config = 6,            // Bad configuration value
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl ErrorKind {
    pub fn message(&self) -> &'static str {
        match self {
            ErrorKind::Process => "Unhandled exception",
            ErrorKind::UnsupportedFormat => "File format is not supported. Use csv or xlsx",
            ErrorKind::Parse => "File could not be read. Is it a valid csv or xlsx file?",
            ErrorKind::UnknownColumn => "Selected column does not exist in the table",
            ErrorKind::Imputation => "Cannot fill missing values of a column with no values",
            ErrorKind::Export => "Table could not be written in the requested format",
            ErrorKind::Config => "Invalid conversion settings",
        }
    }
}

/// Tabular formats understood on both the input and output side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableFormat {
    Csv,
    Xlsx,
}

impl TableFormat {
    /// Resolve an input file extension. Only the canonical extensions are accepted.
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "csv" => Ok(TableFormat::Csv),
            "xlsx" => Ok(TableFormat::Xlsx),
            "" => Err(TableError::UnsupportedFormat(
                "file has no extension".to_string(),
            )),
            other => Err(TableError::UnsupportedFormat(format!(".{}", other))),
        }
    }

    /// Resolve a user-selected export target (`csv`, `xlsx` or `excel`).
    pub fn parse_target(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "excel" => Ok(TableFormat::Xlsx),
            other => TableFormat::from_extension(other),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            TableFormat::Csv => "csv",
            TableFormat::Xlsx => "xlsx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            TableFormat::Csv => constants::CSV_MIME,
            TableFormat::Xlsx => constants::XLSX_MIME,
        }
    }
}

impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Column values. `None` is the explicit missing marker.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            ColumnData::Numeric(v) => matches!(v.get(row), Some(None)),
            ColumnData::Text(v) => matches!(v.get(row), Some(None)),
        }
    }

    pub fn missing_count(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Text(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    /// Values at the given row positions, in that order
    pub fn take(&self, rows: &[usize]) -> ColumnData {
        match self {
            ColumnData::Numeric(v) => ColumnData::Numeric(rows.iter().map(|&r| v[r]).collect()),
            ColumnData::Text(v) => {
                ColumnData::Text(rows.iter().map(|&r| v[r].clone()).collect())
            }
        }
    }

    /// Display form of a cell; missing renders as an empty string
    pub fn render(&self, row: usize) -> String {
        match self {
            ColumnData::Numeric(v) => v
                .get(row)
                .copied()
                .flatten()
                .map(format_number)
                .unwrap_or_default(),
            ColumnData::Text(v) => v.get(row).cloned().flatten().unwrap_or_default(),
        }
    }
}

/// Shortest decimal form that parses back to the same value (`1`, `2.5`).
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Column {
            name: name.into(),
            data,
        }
    }

    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Column::new(name, ColumnData::Numeric(values))
    }

    pub fn text<S: Into<String>>(name: impl Into<String>, values: Vec<Option<S>>) -> Self {
        Column::new(
            name,
            ColumnData::Text(values.into_iter().map(|v| v.map(Into::into)).collect()),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn into_data(self) -> ColumnData {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.data, ColumnData::Numeric(_))
    }

    /// Reported type: numeric columns whose present values are all integral are `Integer`
    pub fn data_type(&self) -> DataType {
        match &self.data {
            ColumnData::Text(_) => DataType::Text,
            ColumnData::Numeric(v) => {
                let mut present = v.iter().flatten().peekable();
                if present.peek().is_none() {
                    return DataType::Float;
                }
                if present.all(|x| x.is_finite() && x.fract() == 0.0) {
                    DataType::Integer
                } else {
                    DataType::Float
                }
            }
        }
    }
}

/// Ordered named columns of equal length
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Build a table, rejecting columns of unequal length.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != expected) {
                return Err(TableError::Parse(format!(
                    "column \"{}\" has {} values, expected {}",
                    bad.name(),
                    bad.len(),
                    expected
                )));
            }
        }
        Ok(Table { columns })
    }

    /// Build from columns already known to share one length.
    pub(crate) fn from_columns_unchecked(columns: Vec<Column>) -> Self {
        debug_assert!(columns.windows(2).all(|w| w[0].len() == w[1].len()));
        Table { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name().to_string()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Rows at the given positions, in that order
    pub fn take_rows(&self, rows: &[usize]) -> Table {
        Table::from_columns_unchecked(
            self.columns
                .iter()
                .map(|c| Column::new(c.name(), c.data().take(rows)))
                .collect(),
        )
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> Table {
        let rows: Vec<usize> = (0..self.row_count().min(n)).collect();
        self.take_rows(&rows)
    }

    /// Cells rendered as display strings, row-major
    pub fn render_rows(&self) -> Vec<Vec<String>> {
        (0..self.row_count())
            .map(|row| self.columns.iter().map(|c| c.data().render(row)).collect())
            .collect()
    }
}

/// Constants
pub mod constants {
    pub const DEFAULT_PREVIEW_ROWS: usize = 5;
    pub const CHART_MAX_COLUMNS: usize = 2;
    pub const CSVA_GUESS_SIZE: usize = 5120; // 5KB threshold for quick charset guess
    pub const BINARY_PERCENT: usize = 20;
    pub const FIELD_DELIM_PERCENT: usize = 50;
    pub const SNIFF_LINES: usize = 100;
    pub const DEFAULT_SHEET_NAME: &str = "Sheet1";
    pub const SHEET_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub const CSV_MIME: &str = "text/csv";
    pub const XLSX_MIME: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

    /// Candidate field delimiters in priority order
    pub const FIELD_DELIMS: [char; 4] = [',', ';', '\t', '|'];

    /// Cell texts read as missing values
    pub const MISSING_MARKERS: [&str; 12] = [
        "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "null", "NULL", "None", "#N/A", "<NA>",
    ];
}
