use crate::error::{Result, TableError};
use crate::loader::LoadOptions;
use crate::types::TableFormat;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// What mean imputation does with a numeric column that has no values at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyColumnPolicy {
    #[default]
    LeaveMissing,
    Fail,
}

impl EmptyColumnPolicy {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "leave" | "leave_missing" | "missing" => Ok(EmptyColumnPolicy::LeaveMissing),
            "fail" | "error" => Ok(EmptyColumnPolicy::Fail),
            other => Err(TableError::Config(format!(
                "unknown empty column policy \"{}\"",
                other
            ))),
        }
    }
}

/// Cleaning steps selected for one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningOptions {
    pub deduplicate: bool,
    pub impute_mean: bool,
    /// Columns to keep, in output order. `None` keeps every column.
    pub columns: Option<Vec<String>>,
    pub empty_column_policy: EmptyColumnPolicy,
}

/// Everything needed to convert one uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub cleaning: CleaningOptions,
    pub target: TableFormat,
    pub load: LoadOptions,
}

impl ConversionRequest {
    pub fn new(target: TableFormat) -> Self {
        ConversionRequest {
            cleaning: CleaningOptions::default(),
            target,
            load: LoadOptions::default(),
        }
    }

    pub fn with_cleaning(mut self, cleaning: CleaningOptions) -> Self {
        self.cleaning = cleaning;
        self
    }

    pub fn with_load_options(mut self, load: LoadOptions) -> Self {
        self.load = load;
        self
    }
}

/// Conversion defaults read from a profile file or the environment.
/// Unset fields leave the decision to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertProfile {
    pub target: Option<TableFormat>,
    pub deduplicate: Option<bool>,
    pub impute_mean: Option<bool>,
    pub columns: Option<Vec<String>>,
    pub empty_column_policy: Option<EmptyColumnPolicy>,
    pub delimiter: Option<u8>,
}

impl ConvertProfile {
    /// Load defaults from environment variables. Unset variables are skipped.
    pub fn from_env() -> Result<Self> {
        let vars: HashMap<String, String> = [
            ("TABCONV_TARGET", "TARGET"),
            ("TABCONV_DEDUPLICATE", "DEDUPLICATE"),
            ("TABCONV_IMPUTE_MEAN", "IMPUTE_MEAN"),
            ("TABCONV_COLUMNS", "COLUMNS"),
            ("TABCONV_EMPTY_COLUMN_POLICY", "EMPTY_COLUMN_POLICY"),
            ("TABCONV_DELIMITER", "DELIMITER"),
        ]
        .iter()
        .filter_map(|(var, key)| env::var(var).ok().map(|v| (key.to_string(), v)))
        .collect();

        Self::from_values(&vars)
    }

    /// Load defaults from a config file.
    /// Reads from the [CONVERT] section
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            TableError::Config(format!("Failed to read config file: {}", e))
        })?;

        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current_section = String::new();

        for line in content.lines() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                current_section = line[1..line.len() - 1].trim().to_uppercase();
                sections.entry(current_section.clone()).or_default();
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim().to_uppercase();
                let value = value
                    .trim()
                    .trim_matches('"')
                    .trim_matches('\'')
                    .to_string();

                if let Some(section) = sections.get_mut(&current_section) {
                    section.insert(key, value);
                }
            }
        }

        let convert = sections.get("CONVERT").ok_or_else(|| {
            TableError::Config("Missing [CONVERT] section in config file".to_string())
        })?;

        Self::from_values(convert)
    }

    fn from_values(values: &HashMap<String, String>) -> Result<Self> {
        Ok(ConvertProfile {
            target: values
                .get("TARGET")
                .map(|v| {
                    TableFormat::parse_target(v)
                        .map_err(|_| TableError::Config(format!("unknown TARGET \"{}\"", v)))
                })
                .transpose()?,
            deduplicate: values
                .get("DEDUPLICATE")
                .map(|v| parse_flag("DEDUPLICATE", v))
                .transpose()?,
            impute_mean: values
                .get("IMPUTE_MEAN")
                .map(|v| parse_flag("IMPUTE_MEAN", v))
                .transpose()?,
            columns: values.get("COLUMNS").map(|v| parse_column_list(v)),
            empty_column_policy: values
                .get("EMPTY_COLUMN_POLICY")
                .map(|v| EmptyColumnPolicy::parse(v))
                .transpose()?,
            delimiter: values
                .get("DELIMITER")
                .map(|v| parse_delimiter(v))
                .transpose()?,
        })
    }

    /// Fill fields unset in `self` from `fallback`
    pub fn or(self, fallback: ConvertProfile) -> ConvertProfile {
        ConvertProfile {
            target: self.target.or(fallback.target),
            deduplicate: self.deduplicate.or(fallback.deduplicate),
            impute_mean: self.impute_mean.or(fallback.impute_mean),
            columns: self.columns.or(fallback.columns),
            empty_column_policy: self.empty_column_policy.or(fallback.empty_column_policy),
            delimiter: self.delimiter.or(fallback.delimiter),
        }
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(TableError::Config(format!(
            "{} must be true or false, got \"{}\"",
            key, value
        ))),
    }
}

/// Split a comma separated column list, dropping blank entries
pub fn parse_column_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Accepts a single ASCII character or the words `tab` / `\t`
pub fn parse_delimiter(value: &str) -> Result<u8> {
    match value {
        "tab" | "\\t" | "\t" => return Ok(b'\t'),
        _ => {}
    }
    match value.as_bytes() {
        [b] if b.is_ascii() && *b != b'"' && *b != b'\n' => Ok(*b),
        _ => Err(TableError::Config(format!(
            "DELIMITER must be a single ASCII character, got \"{}\"",
            value
        ))),
    }
}
