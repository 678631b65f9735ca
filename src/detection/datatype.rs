use crate::types::constants::MISSING_MARKERS;
use crate::types::{ColumnData, DataType};
use once_cell::sync::Lazy;
use regex::Regex;

/// Decimal or scientific literal, or a signed `inf` / `infinity` word (any case)
static NUMBER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[+-]?((\d+\.?\d*|\.\d+)(e[+-]?\d+)?|inf|infinity)$")
        .expect("valid number regex")
});

/// Check whether a raw cell text stands for a missing value
pub fn is_missing_marker(value: &str) -> bool {
    MISSING_MARKERS.contains(&value.trim())
}

/// Parse a cell text as a number, if it is a numeric literal
pub fn parse_number(value: &str) -> Option<f64> {
    let value = value.trim();
    if !NUMBER_REGEX.is_match(value) {
        return None;
    }
    value.parse::<f64>().ok()
}

/// Detect the data type of a single non-missing value
pub fn detect_value_type(value: &str) -> DataType {
    let value = value.trim();
    match parse_number(value) {
        Some(n) if n.fract() == 0.0 && !value.contains(['.', 'e', 'E']) => DataType::Integer,
        Some(_) => DataType::Float,
        None => DataType::Text,
    }
}

/// Detect the data type for an entire column.
/// Missing values are skipped; an all-missing column counts as `Float`.
pub fn detect_data_type(values: &[&str]) -> DataType {
    let mut current_type: Option<DataType> = None;

    for value in values {
        if is_missing_marker(value) {
            continue;
        }

        let value_type = detect_value_type(value);
        current_type = match current_type {
            None => Some(value_type),
            Some(ct) => {
                let new_type = downgrade_types(ct, value_type);
                if new_type == DataType::Text {
                    return DataType::Text;
                }
                Some(new_type)
            }
        };
    }

    current_type.unwrap_or(DataType::Float)
}

/// Downgrade types when there's a mismatch
fn downgrade_types(type1: DataType, type2: DataType) -> DataType {
    use DataType::*;

    match (type1, type2) {
        (a, b) if a == b => a,
        (Integer, Float) | (Float, Integer) => Float,
        _ => Text,
    }
}

/// Convert raw cell texts into typed column values.
/// Text columns keep the cell text verbatim; missing markers become `None`.
pub fn build_column_data(values: &[&str]) -> ColumnData {
    if detect_data_type(values).is_numeric() {
        ColumnData::Numeric(
            values
                .iter()
                .map(|v| if is_missing_marker(v) { None } else { parse_number(v) })
                .collect(),
        )
    } else {
        ColumnData::Text(
            values
                .iter()
                .map(|v| {
                    if is_missing_marker(v) {
                        None
                    } else {
                        Some(v.to_string())
                    }
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_text() {
        assert_eq!(detect_value_type("hello"), DataType::Text);
        assert_eq!(detect_value_type("infinite"), DataType::Text);
        assert_eq!(detect_value_type("1,5"), DataType::Text);
    }

    #[test]
    fn test_detect_infinity() {
        assert_eq!(detect_value_type("inf"), DataType::Float);
        assert_eq!(detect_value_type("-Infinity"), DataType::Float);
        assert_eq!(detect_value_type("1e999"), DataType::Float);
        assert_eq!(parse_number("+INF"), Some(f64::INFINITY));
        assert_eq!(parse_number("-inf"), Some(f64::NEG_INFINITY));
        assert_eq!(
            build_column_data(&["1", "inf", ""]),
            ColumnData::Numeric(vec![Some(1.0), Some(f64::INFINITY), None])
        );
    }

    #[test]
    fn test_detect_integer() {
        assert_eq!(detect_value_type("123"), DataType::Integer);
        assert_eq!(detect_value_type("-456"), DataType::Integer);
        assert_eq!(detect_value_type(" 7 "), DataType::Integer);
    }

    #[test]
    fn test_detect_float() {
        assert_eq!(detect_value_type("12.34"), DataType::Float);
        assert_eq!(detect_value_type("1."), DataType::Float);
        assert_eq!(detect_value_type(".5"), DataType::Float);
        assert_eq!(detect_value_type("1e3"), DataType::Float);
    }

    #[test]
    fn test_missing_markers() {
        assert!(is_missing_marker(""));
        assert!(is_missing_marker("NA"));
        assert!(is_missing_marker("NaN"));
        assert!(!is_missing_marker("0"));
        assert!(!is_missing_marker("missing"));
    }

    #[test]
    fn test_column_type_detection() {
        assert_eq!(detect_data_type(&["1", "2", "", "4"]), DataType::Integer);
        assert_eq!(detect_data_type(&["1", "2", "3.5"]), DataType::Float);
        assert_eq!(detect_data_type(&["1", "hello", "3"]), DataType::Text);
        assert_eq!(detect_data_type(&["", "NA"]), DataType::Float);
    }

    #[test]
    fn test_build_numeric_column() {
        let data = build_column_data(&["1", "", "2.5"]);
        assert_eq!(data, ColumnData::Numeric(vec![Some(1.0), None, Some(2.5)]));
    }

    #[test]
    fn test_build_text_column_keeps_verbatim() {
        let data = build_column_data(&["007", "x", "NA"]);
        assert_eq!(
            data,
            ColumnData::Text(vec![Some("007".to_string()), Some("x".to_string()), None])
        );
    }
}
