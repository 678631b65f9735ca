pub mod chart;
pub mod cleaner;
pub mod config;
pub mod detection;
pub mod error;
pub mod exporter;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod types;
pub mod validation;

pub use chart::chartable_columns;
pub use cleaner::{deduplicate, impute_mean, select_columns};
pub use config::{CleaningOptions, ConversionRequest, ConvertProfile, EmptyColumnPolicy};
pub use error::{Result, TableError};
pub use exporter::{export, export_as, ExportedFile};
pub use loader::{load, load_with_options, LoadOptions};
pub use pipeline::{CleaningStep, Conversion, TableConverter, UploadedFile};
pub use types::{Column, ColumnData, DataType, ErrorKind, Table, TableFormat};
