use crate::cleaner::{deduplicate, impute_mean, select_columns};
use crate::config::ConversionRequest;
use crate::error::Result;
use crate::exporter::{export, ExportedFile};
use crate::loader::load_with_options;
use crate::types::Table;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// A named byte stream handed over by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        UploadedFile {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk, keeping only its file name
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(UploadedFile { name, bytes })
    }

    /// Extension of the file name, without the dot; empty if there is none
    pub fn extension(&self) -> &str {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
    }
}

/// Cleaning steps in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CleaningStep {
    Deduplicate,
    ImputeMean,
    SelectColumns,
}

/// Result of converting one file
#[derive(Debug, Clone)]
pub struct Conversion {
    /// Table as loaded, before cleaning
    pub original: Table,
    /// Table as exported
    pub cleaned: Table,
    pub applied: Vec<CleaningStep>,
    pub exported: ExportedFile,
}

/// Runs load, clean and export for files under one request
pub struct TableConverter {
    request: ConversionRequest,
}

impl TableConverter {
    pub fn new(request: ConversionRequest) -> Self {
        TableConverter { request }
    }

    pub fn request(&self) -> &ConversionRequest {
        &self.request
    }

    /// Convert one file. Nothing is produced unless every step succeeds.
    pub fn convert(&self, file: &UploadedFile) -> Result<Conversion> {
        let original = load_with_options(&file.bytes, file.extension(), &self.request.load)?;
        let (cleaned, applied) = self.clean(&original)?;
        let exported = export(&cleaned, self.request.target, &file.name)?;

        log::info!(
            "converted {} ({} rows) to {} ({} rows, {} bytes)",
            file.name,
            original.row_count(),
            exported.filename,
            cleaned.row_count(),
            exported.bytes.len()
        );

        Ok(Conversion {
            original,
            cleaned,
            applied,
            exported,
        })
    }

    /// Apply the selected cleaning steps: deduplicate, impute, then select columns
    pub fn clean(&self, table: &Table) -> Result<(Table, Vec<CleaningStep>)> {
        let cleaning = &self.request.cleaning;
        let mut table = table.clone();
        let mut applied = Vec::new();

        if cleaning.deduplicate {
            table = deduplicate(&table);
            applied.push(CleaningStep::Deduplicate);
        }
        if cleaning.impute_mean {
            table = impute_mean(&table, cleaning.empty_column_policy)?;
            applied.push(CleaningStep::ImputeMean);
        }
        if let Some(columns) = &cleaning.columns {
            table = select_columns(&table, columns.as_slice())?;
            applied.push(CleaningStep::SelectColumns);
        }

        Ok((table, applied))
    }

    /// Convert every file independently; one failure does not stop the rest.
    pub fn convert_batch(&self, files: &[UploadedFile]) -> Vec<(String, Result<Conversion>)> {
        files
            .iter()
            .map(|file| {
                let result = self.convert(file);
                if let Err(e) = &result {
                    log::warn!("failed to convert {}: {}", file.name, e);
                }
                (file.name.clone(), result)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CleaningOptions;
    use crate::error::TableError;
    use crate::loader::load;
    use crate::types::{ColumnData, TableFormat};

    fn converter(cleaning: CleaningOptions, target: TableFormat) -> TableConverter {
        TableConverter::new(ConversionRequest::new(target).with_cleaning(cleaning))
    }

    #[test]
    fn test_extension() {
        assert_eq!(UploadedFile::new("a.b.CSV", vec![]).extension(), "CSV");
        assert_eq!(UploadedFile::new("noext", vec![]).extension(), "");
    }

    #[test]
    fn test_convert_without_cleaning() {
        let file = UploadedFile::new("data.csv", b"a,b\n1,x\n1,x\n".to_vec());
        let conversion = converter(CleaningOptions::default(), TableFormat::Csv)
            .convert(&file)
            .unwrap();

        assert!(conversion.applied.is_empty());
        assert_eq!(conversion.cleaned, conversion.original);
        assert_eq!(conversion.exported.filename, "data.csv");
        assert_eq!(conversion.exported.bytes, b"a,b\n1,x\n1,x\n".to_vec());
    }

    #[test]
    fn test_convert_full_flow() {
        let file = UploadedFile::new("data.csv", b"a,b,c\n1,,x\n,4,y\n1,,x\n".to_vec());
        let cleaning = CleaningOptions {
            deduplicate: true,
            impute_mean: true,
            columns: Some(vec!["b".to_string(), "a".to_string()]),
            ..CleaningOptions::default()
        };
        let conversion = converter(cleaning, TableFormat::Xlsx).convert(&file).unwrap();

        assert_eq!(
            conversion.applied,
            vec![
                CleaningStep::Deduplicate,
                CleaningStep::ImputeMean,
                CleaningStep::SelectColumns
            ]
        );
        assert_eq!(conversion.original.row_count(), 3);
        assert_eq!(conversion.exported.filename, "data.xlsx");

        let reloaded = load(&conversion.exported.bytes, "xlsx").unwrap();
        assert_eq!(reloaded, conversion.cleaned);
        assert_eq!(reloaded.column_names(), vec!["b", "a"]);
        assert_eq!(
            reloaded.column("a").unwrap().data(),
            &ColumnData::Numeric(vec![Some(1.0), Some(1.0)])
        );
    }

    #[test]
    fn test_convert_unknown_column_fails() {
        let file = UploadedFile::new("data.csv", b"a\n1\n".to_vec());
        let cleaning = CleaningOptions {
            columns: Some(vec!["missing".to_string()]),
            ..CleaningOptions::default()
        };
        let result = converter(cleaning, TableFormat::Csv).convert(&file);
        assert!(matches!(result, Err(TableError::UnknownColumn(_))));
    }

    #[test]
    fn test_batch_isolates_failures() {
        let files = vec![
            UploadedFile::new("notes.txt", b"hello".to_vec()),
            UploadedFile::new("good.csv", b"a\n1\n".to_vec()),
            UploadedFile::new("broken.xlsx", b"not a workbook".to_vec()),
        ];
        let results =
            converter(CleaningOptions::default(), TableFormat::Xlsx).convert_batch(&files);

        assert_eq!(results.len(), 3);
        assert!(matches!(results[0].1, Err(TableError::UnsupportedFormat(_))));
        assert_eq!(results[1].0, "good.csv");
        assert_eq!(results[1].1.as_ref().unwrap().exported.filename, "good.xlsx");
        assert!(matches!(results[2].1, Err(TableError::Parse(_))));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.csv");
        fs::write(&path, b"a\n1\n").unwrap();

        let file = UploadedFile::from_path(&path).unwrap();
        assert_eq!(file.name, "input.csv");
        assert_eq!(file.extension(), "csv");
    }
}
