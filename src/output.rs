use crate::chart::chartable_columns;
use crate::error::TableError;
use crate::pipeline::{CleaningStep, Conversion};
use crate::types::{ColumnData, DataType, ErrorKind, Table};
use serde::Serialize;

/// Per-column summary of the exported table
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ColumnSummary {
    pub name: String,
    pub data_type: DataType,
    pub missing: usize,
}

/// One plotted numeric column
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChartSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Success response JSON structure
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SuccessResponse {
    pub file: String,
    pub output_file: String,
    pub mime_type: String,
    pub original_rows: usize,
    pub rows: usize,
    pub steps: Vec<CleaningStep>,
    pub columns: Vec<ColumnSummary>,
    pub preview: Vec<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<Vec<ChartSeries>>,
}

impl SuccessResponse {
    pub fn new(file: String, conversion: &Conversion, preview_rows: usize) -> Self {
        let table = &conversion.cleaned;
        SuccessResponse {
            file,
            output_file: conversion.exported.filename.clone(),
            mime_type: conversion.exported.mime_type.to_string(),
            original_rows: conversion.original.row_count(),
            rows: table.row_count(),
            steps: conversion.applied.clone(),
            columns: table
                .columns()
                .iter()
                .map(|c| ColumnSummary {
                    name: c.name().to_string(),
                    data_type: c.data_type(),
                    missing: c.data().missing_count(),
                })
                .collect(),
            preview: table.head(preview_rows).render_rows(),
            chart: None,
        }
    }

    /// Attach chart series for the table. Nothing is attached when no column is numeric.
    pub fn with_chart(mut self, table: &Table) -> Self {
        let series: Vec<ChartSeries> = chartable_columns(table)
            .into_columns()
            .into_iter()
            .filter_map(|c| {
                let name = c.name().to_string();
                match c.into_data() {
                    ColumnData::Numeric(values) => Some(ChartSeries { name, values }),
                    ColumnData::Text(_) => None,
                }
            })
            .collect();

        if !series.is_empty() {
            self.chart = Some(series);
        }
        self
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Error response JSON structure
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorResponse {
    pub error: ErrorKind,
    pub error_msg_user: String,
    pub error_msg_internal: String,
    pub file: String,
}

impl ErrorResponse {
    pub fn new(file: String, error: &TableError) -> Self {
        let kind = error.kind();
        ErrorResponse {
            error: kind,
            error_msg_user: kind.message().to_string(),
            error_msg_internal: error.to_string(),
            file,
        }
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CleaningOptions, ConversionRequest};
    use crate::pipeline::{TableConverter, UploadedFile};
    use crate::types::TableFormat;

    fn conversion(csv: &[u8]) -> Conversion {
        let request = ConversionRequest::new(TableFormat::Csv).with_cleaning(CleaningOptions {
            deduplicate: true,
            ..CleaningOptions::default()
        });
        TableConverter::new(request)
            .convert(&UploadedFile::new("in.csv", csv.to_vec()))
            .unwrap()
    }

    #[test]
    fn test_success_response_json() {
        let conversion = conversion(b"a,b\n1,x\n1,x\n,y\n");
        let response = SuccessResponse::new("in.csv".to_string(), &conversion, 1);

        assert_eq!(response.preview, vec![vec!["1", "x"]]);
        let json = response.to_json();
        assert!(json.contains("\"OutputFile\":\"in.csv\""));
        assert!(json.contains("\"OriginalRows\":3"));
        assert!(json.contains("\"Rows\":2"));
        assert!(json.contains("\"Steps\":[\"Deduplicate\"]"));
        assert!(json.contains("{\"Name\":\"a\",\"DataType\":1,\"Missing\":1}"));
        assert!(!json.contains("\"Chart\""));
    }

    #[test]
    fn test_chart_series() {
        let conversion = conversion(b"t,a,b,c\nx,1,2,3\ny,,5,6\n");
        let response = SuccessResponse::new("in.csv".to_string(), &conversion, 5)
            .with_chart(&conversion.cleaned);

        let chart = response.chart.as_ref().unwrap();
        assert_eq!(chart.len(), 2);
        assert_eq!(chart[0].name, "a");
        assert_eq!(chart[0].values, vec![Some(1.0), None]);
        assert!(response.to_json().contains("\"Values\":[1.0,null]"));
    }

    #[test]
    fn test_chart_without_numeric_columns() {
        let conversion = conversion(b"t\nx\n");
        let response = SuccessResponse::new("in.csv".to_string(), &conversion, 5)
            .with_chart(&conversion.cleaned);
        assert!(response.chart.is_none());
    }

    #[test]
    fn test_error_response_json() {
        let error = TableError::UnknownColumn("z".to_string());
        let response = ErrorResponse::new("in.csv".to_string(), &error);

        let json = response.to_json();
        assert!(json.contains("\"Error\":3"));
        assert!(json.contains("\"ErrorMsgUser\":\"Selected column does not exist in the table\""));
        assert!(json.contains("\"ErrorMsgInternal\":\"Unknown column: z\""));
    }
}
