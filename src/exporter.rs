use crate::error::{Result, TableError};
use crate::types::constants::DEFAULT_SHEET_NAME;
use crate::types::{format_number, ColumnData, Table, TableFormat};
use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Workbook};
use std::path::Path;

/// A serialized table ready to hand to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub filename: String,
}

/// Serialize `table` as `format`. Identical input always gives identical bytes.
pub fn export(table: &Table, format: TableFormat, original_filename: &str) -> Result<ExportedFile> {
    let bytes = match format {
        TableFormat::Csv => write_csv(table)?,
        TableFormat::Xlsx => write_xlsx(table)?,
    };

    Ok(ExportedFile {
        bytes,
        mime_type: format.mime_type(),
        filename: output_filename(original_filename, format),
    })
}

/// Same as [`export`], with the target given by name (`csv`, `xlsx`, `excel`).
pub fn export_as(table: &Table, target: &str, original_filename: &str) -> Result<ExportedFile> {
    export(table, TableFormat::parse_target(target)?, original_filename)
}

/// Original file name with its extension replaced by the target's
pub fn output_filename(original: &str, format: TableFormat) -> String {
    let name = Path::new(original)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("table");

    Path::new(name)
        .with_extension(format.extension())
        .to_string_lossy()
        .into_owned()
}

fn write_csv(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let to_export_err = |e: csv::Error| TableError::Export(e.to_string());

    if table.column_count() > 0 {
        writer
            .write_record(table.columns().iter().map(|c| c.name()))
            .map_err(to_export_err)?;
    }
    for row in 0..table.row_count() {
        writer
            .write_record(table.columns().iter().map(|c| c.data().render(row)))
            .map_err(to_export_err)?;
    }

    writer
        .into_inner()
        .map_err(|e| TableError::Export(e.to_string()))
}

enum SheetValue<'a> {
    Number(f64),
    Text(&'a str),
}

fn write_xlsx(table: &Table) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    // A fixed creation time keeps the container byte-identical across runs
    let created = ExcelDateTime::from_ymd(2000, 1, 1)?;
    workbook.set_properties(&DocProperties::new().set_creation_datetime(&created));

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(DEFAULT_SHEET_NAME)?;
    let blank = Format::new();

    for (col_idx, column) in table.columns().iter().enumerate() {
        let col = u16::try_from(col_idx).map_err(|_| {
            TableError::Export(format!("too many columns for a worksheet: {}", col_idx + 1))
        })?;
        worksheet.write_string(0, col, column.name())?;

        let last_row = column.len().checked_sub(1);
        for row_idx in 0..column.len() {
            let row = u32::try_from(row_idx + 1).map_err(|_| {
                TableError::Export(format!("too many rows for a worksheet: {}", row_idx + 1))
            })?;
            let cell = match column.data() {
                ColumnData::Numeric(values) => values[row_idx].map(SheetValue::Number),
                ColumnData::Text(values) => values[row_idx].as_deref().map(SheetValue::Text),
            };
            match cell {
                Some(SheetValue::Number(value)) if value.is_finite() => {
                    worksheet.write_number(row, col, value)?;
                }
                Some(SheetValue::Number(value)) => {
                    worksheet.write_string(row, col, format_number(value))?;
                }
                Some(SheetValue::Text(value)) => {
                    worksheet.write_string(row, col, value)?;
                }
                // The sheet dimension must reach the last row even when it is all missing
                None if Some(row_idx) == last_row => {
                    worksheet.write_blank(row, col, &blank)?;
                }
                None => {}
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}
