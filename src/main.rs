use clap::Parser;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tabconv::config::{parse_delimiter, ConvertProfile};
use tabconv::output::{ErrorResponse, SuccessResponse};
use tabconv::types::constants::DEFAULT_PREVIEW_ROWS;
use tabconv::{
    CleaningOptions, Conversion, ConversionRequest, EmptyColumnPolicy, LoadOptions, Result,
    TableConverter, TableError, TableFormat, UploadedFile,
};

/// Table Converter - Clean CSV and Excel files and convert between formats
#[derive(Parser, Debug)]
#[command(name = "tabconv")]
#[command(about = "Load CSV or Excel files, clean them and convert them to another format")]
#[command(
    version,
    after_help = "Tool will write each converted file to the output directory and print one JSON report per input file.\nFailed files are reported with an \"Error\" code and do not stop the others."
)]
struct Args {
    /// Input files (.csv or .xlsx)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Target format: csv, xlsx or excel
    #[arg(short = 't', long = "to")]
    to: Option<String>,

    /// Remove rows that duplicate an earlier row
    #[arg(long = "deduplicate")]
    deduplicate: bool,

    /// Keep duplicate rows even if the config file or environment enables deduplication
    #[arg(long = "no-deduplicate", conflicts_with = "deduplicate")]
    no_deduplicate: bool,

    /// Fill missing numeric values with the column mean
    #[arg(long = "impute-mean")]
    impute_mean: bool,

    /// Leave missing values even if the config file or environment enables imputation
    #[arg(long = "no-impute-mean", conflicts_with = "impute_mean")]
    no_impute_mean: bool,

    /// Columns to keep, in output order (comma separated)
    #[arg(long = "columns", value_delimiter = ',')]
    columns: Option<Vec<String>>,

    /// Fail instead of leaving all-missing numeric columns untouched
    #[arg(long = "fail-on-empty-column")]
    fail_on_empty_column: bool,

    /// Include the first two numeric columns as chart series in the report
    #[arg(long = "chart")]
    chart: bool,

    /// Number of preview rows in the report (default: 5)
    #[arg(long = "preview-rows")]
    preview_rows: Option<usize>,

    /// CSV field delimiter (default: ",")
    #[arg(short = 'd', long = "delimiter")]
    delimiter: Option<String>,

    /// Guess the CSV field delimiter from the file
    #[arg(long = "sniff-delimiter")]
    sniff_delimiter: bool,

    /// Directory for converted files
    #[arg(short = 'o', long = "out-dir", default_value = ".")]
    out_dir: PathBuf,

    /// Path to a profile file with a [CONVERT] section
    #[arg(short = 'c', long = "config")]
    config_file: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let request = match build_request(&args) {
        Ok(request) => request,
        Err(e) => {
            println!("{}", ErrorResponse::new(String::new(), &e).to_json());
            std::process::exit(1);
        }
    };

    if let Err(e) = fs::create_dir_all(&args.out_dir) {
        println!("{}", ErrorResponse::new(String::new(), &TableError::from(e)).to_json());
        std::process::exit(1);
    }

    let preview_rows = args.preview_rows.unwrap_or(DEFAULT_PREVIEW_ROWS);
    let mut failed = false;

    // Unreadable inputs are reported right away, the rest go through the converter
    let mut inputs: Vec<PathBuf> = Vec::new();
    let mut uploads: Vec<UploadedFile> = Vec::new();
    for path in &args.files {
        match UploadedFile::from_path(path) {
            Ok(upload) => {
                inputs.push(path.clone());
                uploads.push(upload);
            }
            Err(e) => {
                failed = true;
                println!("{}", ErrorResponse::new(path.display().to_string(), &e).to_json());
            }
        }
    }

    let converter = TableConverter::new(request);
    let mut writer = OutputWriter::new(&args.out_dir);
    for (input, (name, result)) in inputs.iter().zip(converter.convert_batch(&uploads)) {
        let report = result.and_then(|conversion| {
            writer.write(input, &conversion)?;
            let response = SuccessResponse::new(name.clone(), &conversion, preview_rows);
            Ok(if args.chart {
                response.with_chart(&conversion.cleaned)
            } else {
                response
            })
        });

        match report {
            Ok(response) => println!("{}", response.to_json()),
            Err(e) => {
                failed = true;
                println!("{}", ErrorResponse::new(name, &e).to_json());
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
}

fn build_request(args: &Args) -> Result<ConversionRequest> {
    // Priority: CLI args > config file > environment variables
    let cli = ConvertProfile {
        target: args.to.as_deref().map(TableFormat::parse_target).transpose()?,
        deduplicate: flag(args.deduplicate, args.no_deduplicate),
        impute_mean: flag(args.impute_mean, args.no_impute_mean),
        columns: args.columns.clone(),
        empty_column_policy: args.fail_on_empty_column.then_some(EmptyColumnPolicy::Fail),
        delimiter: args.delimiter.as_deref().map(parse_delimiter).transpose()?,
    };

    let file = match &args.config_file {
        Some(path) if !path.exists() => {
            return Err(TableError::Config(format!(
                "Config file not found: {}",
                path.display()
            )))
        }
        Some(path) => ConvertProfile::from_file(path)?,
        None => ConvertProfile::default(),
    };

    let profile = cli.or(file).or(ConvertProfile::from_env()?);

    let target = profile.target.ok_or_else(|| {
        TableError::Config(
            "Target format not set. Please provide it via:\n\
             - CLI argument (--to csv|xlsx)\n\
             - Config file (TARGET in the [CONVERT] section)\n\
             - Environment variable (TABCONV_TARGET)"
                .to_string(),
        )
    })?;

    let cleaning = CleaningOptions {
        deduplicate: profile.deduplicate.unwrap_or(false),
        impute_mean: profile.impute_mean.unwrap_or(false),
        columns: profile.columns,
        empty_column_policy: profile.empty_column_policy.unwrap_or_default(),
    };
    let load = LoadOptions {
        delimiter: profile.delimiter.unwrap_or(b','),
        sniff_delimiter: args.sniff_delimiter,
    };

    Ok(ConversionRequest::new(target)
        .with_cleaning(cleaning)
        .with_load_options(load))
}

/// Value of an on/off flag pair; `None` leaves the decision to the config file or environment
fn flag(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// Writes converted files into one directory.
/// Each target is written once per run and never over an input file.
struct OutputWriter {
    out_dir: PathBuf,
    written: HashSet<PathBuf>,
}

impl OutputWriter {
    fn new(out_dir: &Path) -> Self {
        OutputWriter {
            out_dir: out_dir.to_path_buf(),
            written: HashSet::new(),
        }
    }

    fn write(&mut self, input: &Path, conversion: &Conversion) -> Result<PathBuf> {
        let target = self.out_dir.join(&conversion.exported.filename);
        if self.written.contains(&target) {
            return Err(TableError::Config(format!(
                "output {} was already written for an earlier input",
                target.display()
            )));
        }
        if target.exists() && fs::canonicalize(&target)? == fs::canonicalize(input)? {
            return Err(TableError::Config(format!(
                "refusing to overwrite input file {}",
                input.display()
            )));
        }

        fs::write(&target, &conversion.exported.bytes)?;
        log::debug!("wrote {}", target.display());
        self.written.insert(target.clone());
        Ok(target)
    }
}
