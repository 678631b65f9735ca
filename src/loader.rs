use crate::detection::{
    build_column_data, decode_to_utf8, detect_delimiter, is_missing_marker, parse_number,
};
use crate::error::{Result, TableError};
use crate::types::constants::{SHEET_DATETIME_FORMAT, SNIFF_LINES};
use crate::types::{format_number, Column, ColumnData, Table, TableFormat};
use crate::validation::{has_unterminated_quote, is_binary_data, normalize_header_names};
use calamine::{Data, Reader, Xlsx};
use chrono::NaiveDateTime;
use std::io::Cursor;

/// Options for reading delimited text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Field delimiter used when sniffing is off or inconclusive
    pub delimiter: u8,
    /// Guess the delimiter from the first lines of the file
    pub sniff_delimiter: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            delimiter: b',',
            sniff_delimiter: false,
        }
    }
}

/// Parse an uploaded byte stream into a table, dispatching on the file extension.
pub fn load(bytes: &[u8], extension: &str) -> Result<Table> {
    load_with_options(bytes, extension, &LoadOptions::default())
}

pub fn load_with_options(bytes: &[u8], extension: &str, options: &LoadOptions) -> Result<Table> {
    let table = match TableFormat::from_extension(extension)? {
        TableFormat::Csv => load_csv(bytes, options)?,
        TableFormat::Xlsx => load_xlsx(bytes)?,
    };

    log::debug!(
        "loaded {} rows x {} columns from .{}",
        table.row_count(),
        table.column_count(),
        extension
    );
    for column in table.columns() {
        log::debug!("column {:?} inferred as {:?}", column.name(), column.data_type());
    }

    Ok(table)
}

// ---------------------------------------------------------------------------
// Delimited text
// ---------------------------------------------------------------------------

fn load_csv(bytes: &[u8], options: &LoadOptions) -> Result<Table> {
    if is_binary_data(bytes) {
        return Err(TableError::Parse("file is binary".to_string()));
    }

    let text = decode_to_utf8(bytes)?;
    let delimiter = if options.sniff_delimiter {
        sniff_delimiter(&text).unwrap_or(options.delimiter)
    } else {
        options.delimiter
    };

    // The csv reader would take the rest of the file as one field
    if has_unterminated_quote(&text, char::from(delimiter), '"') {
        return Err(TableError::Parse("unterminated quoted field".to_string()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record?,
        None => return Err(TableError::Parse("no columns to parse from file".to_string())),
    };
    let names = normalize_header_names(&header.iter().map(str::to_string).collect::<Vec<_>>());

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); names.len()];
    for record in records {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.len() > names.len() {
            return Err(TableError::Parse(format!(
                "expected {} fields in line {}, saw {}",
                names.len(),
                line,
                record.len()
            )));
        }
        if record.len() < names.len() {
            log::warn!(
                "line {} has {} of {} fields, padding with missing values",
                line,
                record.len(),
                names.len()
            );
        }

        for (idx, column) in cells.iter_mut().enumerate() {
            column.push(record.get(idx).unwrap_or("").to_string());
        }
    }

    let columns = names
        .into_iter()
        .zip(cells)
        .map(|(name, values)| {
            let values: Vec<&str> = values.iter().map(String::as_str).collect();
            Column::new(name, build_column_data(&values))
        })
        .collect();

    Ok(Table::from_columns_unchecked(columns))
}

fn sniff_delimiter(text: &str) -> Option<u8> {
    let lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    let delimiter = detect_delimiter(&lines, '"')?;
    log::debug!("sniffed delimiter {:?}", delimiter);
    u8::try_from(delimiter).ok()
}

// ---------------------------------------------------------------------------
// Spreadsheet
// ---------------------------------------------------------------------------

/// A spreadsheet cell before column typing
#[derive(Debug, Clone, PartialEq)]
enum SheetCell {
    Missing,
    Number(f64),
    Text(String),
}

impl SheetCell {
    fn from_data(cell: &Data) -> Self {
        match cell {
            Data::Empty | Data::Error(_) => SheetCell::Missing,
            Data::Float(f) => SheetCell::Number(*f),
            Data::Int(i) => SheetCell::Number(*i as f64),
            Data::String(s) if is_missing_marker(s) => SheetCell::Missing,
            Data::String(s) => SheetCell::Text(s.clone()),
            Data::Bool(b) => SheetCell::Text(b.to_string()),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(datetime) => SheetCell::Text(format_sheet_datetime(&datetime)),
                None => SheetCell::Number(dt.as_f64()),
            },
            other => SheetCell::Text(other.to_string()),
        }
    }

    /// Numeric value of the cell; infinities are stored as text in a workbook
    fn number(&self) -> Option<f64> {
        match self {
            SheetCell::Number(n) => Some(*n),
            SheetCell::Text(s) => parse_number(s).filter(|n| n.is_infinite()),
            SheetCell::Missing => None,
        }
    }

    fn into_text(self) -> Option<String> {
        match self {
            SheetCell::Missing => None,
            SheetCell::Number(n) => Some(format_number(n)),
            SheetCell::Text(s) => Some(s),
        }
    }
}

fn format_sheet_datetime(datetime: &NaiveDateTime) -> String {
    datetime.format(SHEET_DATETIME_FORMAT).to_string()
}

/// Read the first worksheet; the first row of its used range is the header.
fn load_xlsx(bytes: &[u8]) -> Result<Table> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| TableError::Parse("workbook has no worksheets".to_string()))?;

    // Blank cells are left out of the range but still counted in the declared dimension
    let declared_end = workbook.worksheet_cells_reader(&sheet)?.dimensions().end.0;
    let range = workbook.worksheet_range(&sheet)?;
    let header_row = match range.start() {
        Some((row, _)) => row,
        None => return Ok(Table::default()),
    };

    let mut rows = range.rows();
    let header: Vec<String> = match rows.next() {
        Some(row) => row
            .iter()
            .map(|cell| SheetCell::from_data(cell).into_text().unwrap_or_default())
            .collect(),
        None => return Ok(Table::default()),
    };
    let names = normalize_header_names(&header);

    let mut cells: Vec<Vec<SheetCell>> = vec![Vec::new(); names.len()];
    for row in rows {
        for (idx, column) in cells.iter_mut().enumerate() {
            column.push(
                row.get(idx)
                    .map(SheetCell::from_data)
                    .unwrap_or(SheetCell::Missing),
            );
        }
    }

    let declared_rows = declared_end.saturating_sub(header_row) as usize;
    if cells.first().is_some_and(|c| c.len() < declared_rows) {
        log::debug!("sheet {:?} ends in blank rows, padding to {}", sheet, declared_rows);
        for column in cells.iter_mut() {
            column.resize(declared_rows, SheetCell::Missing);
        }
    }

    let columns = names
        .into_iter()
        .zip(cells)
        .map(|(name, values)| Column::new(name, sheet_column_data(values)))
        .collect();

    Ok(Table::from_columns_unchecked(columns))
}

/// Numeric when every present cell is a number, otherwise text
fn sheet_column_data(values: Vec<SheetCell>) -> ColumnData {
    let numeric = values
        .iter()
        .all(|c| matches!(c, SheetCell::Missing) || c.number().is_some());
    if numeric {
        ColumnData::Numeric(values.iter().map(SheetCell::number).collect())
    } else {
        ColumnData::Text(values.into_iter().map(SheetCell::into_text).collect())
    }
}
