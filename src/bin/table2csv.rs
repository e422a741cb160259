use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use policy_table_ocr::{
    ColumnLabel, CropRegion, ExtractOptions, ExtractionReport, ProximityClusterer,
    RecordedRecognizer, RegionPreprocessor, TableRow, extract_column, extract_rows, extract_table,
    parse_delimited, rows_to_csv_string, write_rows_csv,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "table2csv",
    version,
    about = "Rebuild insurance illustration tables from recognized text"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract table rows from a recorded recognition pass.
    Extract(ExtractArgs),
    /// Read one column from a recognition pass over a cropped column region.
    Column(ColumnArgs),
    /// Convert a delimited table export into the row format.
    Import(ImportArgs),
    /// Crop and enhance an image region for recognition.
    Preprocess(PreprocessArgs),
}

#[derive(Debug, Args)]
struct TuningArgs {
    /// Minimum age added to truncated ages.
    #[arg(long, default_value_t = policy_table_ocr::DEFAULT_EXPECTED_MIN_AGE)]
    expected_min_age: u32,

    /// Maximum vertical distance between fragments of one row.
    #[arg(long, default_value_t = policy_table_ocr::DEFAULT_ROW_TOLERANCE)]
    row_tolerance: f32,

    /// Maximum rows emitted per extraction.
    #[arg(long, default_value_t = policy_table_ocr::DEFAULT_ROW_CAP)]
    row_cap: usize,

    /// Ignore fragments recognized with lower confidence.
    #[arg(long, default_value_t = 0.0)]
    min_confidence: f32,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// JSON array of recognized fragments.
    #[arg(short, long)]
    fragments: PathBuf,

    /// Source image the fragments were recognized from.
    #[arg(long, requires = "region")]
    image: Option<PathBuf>,

    /// Crop region x,y,width,height in image pixels.
    #[arg(long, requires = "image")]
    region: Option<String>,

    /// Save the enhanced region image here.
    #[arg(long, requires = "region")]
    save_region: Option<PathBuf>,

    /// Output CSV path; prints to stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Print the full report as JSON instead of CSV.
    #[arg(long, conflicts_with = "output")]
    json: bool,

    #[command(flatten)]
    tuning: TuningArgs,

    /// Enable verbose warning output.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct ColumnArgs {
    /// JSON array of fragments recognized from the column region.
    #[arg(short, long)]
    fragments: PathBuf,

    /// Column held by the region: policy_year, insured_age, cash_value or death_benefit.
    #[arg(short, long)]
    label: String,

    #[command(flatten)]
    tuning: TuningArgs,
}

#[derive(Debug, Args)]
struct ImportArgs {
    /// Delimited input file with a header line.
    #[arg(short, long)]
    input: PathBuf,

    /// Output CSV path; prints to stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Input delimiter; detected from the header line when omitted.
    #[arg(long)]
    delimiter: Option<char>,
}

#[derive(Debug, Args)]
struct PreprocessArgs {
    /// Source image.
    #[arg(long)]
    image: PathBuf,

    /// Crop region x,y,width,height in image pixels.
    #[arg(long)]
    region: String,

    /// Output image path.
    #[arg(short, long)]
    output: PathBuf,
}

fn ascii_delimiter(delimiter: char) -> Result<u8> {
    if !delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character");
    }
    Ok(delimiter as u8)
}

fn parse_region(value: &str) -> Result<CropRegion> {
    CropRegion::from_str(value)
        .map_err(|error| anyhow!("invalid crop region: {error}"))
        .with_context(|| format!("failed to parse --region '{value}'"))
}

fn build_options(tuning: &TuningArgs) -> ExtractOptions {
    ExtractOptions {
        expected_min_age: tuning.expected_min_age,
        row_tolerance: tuning.row_tolerance,
        row_cap: tuning.row_cap,
        min_confidence: tuning.min_confidence,
        ..ExtractOptions::default()
    }
}

fn emit_rows(rows: &[TableRow], output: Option<&Path>, delimiter: u8) -> Result<()> {
    match output {
        Some(path) => write_rows_csv(path, rows, delimiter)
            .with_context(|| format!("failed to write '{}'", path.display())),
        None => {
            print!("{}", rows_to_csv_string(rows, delimiter)?);
            Ok(())
        }
    }
}

fn log_report(report: &ExtractionReport, verbose: bool) {
    if report.warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", report.warnings.len());
    if verbose {
        for warning in &report.warnings {
            eprintln!(
                "  - {:?} row={:?} confidence={:?}: {}",
                warning.code, warning.row, warning.confidence, warning.message
            );
        }
        for error in &report.validation.errors {
            eprintln!("  - validation: {error}");
        }
    }
}

async fn run_extract(args: &ExtractArgs) -> Result<ExtractionReport> {
    let options = build_options(&args.tuning);
    let delimiter = ascii_delimiter(args.delimiter)?;
    let recognizer = RecordedRecognizer::from_path(&args.fragments)
        .with_context(|| format!("failed to load fragments '{}'", args.fragments.display()))?;

    let report = match (&args.image, &args.region) {
        (Some(image_path), Some(region)) => {
            let region = parse_region(region)?;
            let image = image::open(image_path)
                .with_context(|| format!("failed to open image '{}'", image_path.display()))?;
            let prepared = RegionPreprocessor::new(options.preprocess).prepare(&image, &region)?;
            if let Some(path) = &args.save_region {
                prepared
                    .save(path)
                    .with_context(|| format!("failed to save region '{}'", path.display()))?;
            }
            extract_table(&recognizer, &prepared, None, &options).await?
        }
        _ => extract_rows(recognizer.fragments(), &options)?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        emit_rows(&report.rows, args.output.as_deref(), delimiter)?;
    }
    Ok(report)
}

fn run_column(args: &ColumnArgs) -> Result<usize> {
    let label = ColumnLabel::from_str(&args.label).map_err(|error| anyhow!(error))?;
    let options = build_options(&args.tuning);
    options.validate()?;
    let recognizer = RecordedRecognizer::from_path(&args.fragments)
        .with_context(|| format!("failed to load fragments '{}'", args.fragments.display()))?;

    let values = extract_column(
        recognizer.fragments(),
        label,
        &ProximityClusterer::new(options.row_tolerance),
        &options,
    );
    println!("{label}");
    for value in &values {
        println!("{value}");
    }
    Ok(values.iter().filter(|value| !value.is_empty()).count())
}

fn run_import(args: &ImportArgs) -> Result<usize> {
    let delimiter = args.delimiter.map(ascii_delimiter).transpose()?;
    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("failed to read '{}'", args.input.display()))?;
    let rows = parse_delimited(&bytes, delimiter)
        .with_context(|| format!("failed to parse '{}'", args.input.display()))?;
    emit_rows(&rows, args.output.as_deref(), b',')?;
    Ok(rows.len())
}

fn run_preprocess(args: &PreprocessArgs) -> Result<()> {
    let region = parse_region(&args.region)?;
    let image = image::open(&args.image)
        .with_context(|| format!("failed to open image '{}'", args.image.display()))?;
    let prepared = RegionPreprocessor::default().prepare(&image, &region)?;
    prepared
        .save(&args.output)
        .with_context(|| format!("failed to save '{}'", args.output.display()))?;
    Ok(())
}

fn exit_for_count(count: usize) -> ExitCode {
    if count > 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}

fn report_error(error: &anyhow::Error) -> ExitCode {
    eprintln!("error: {error:#}");
    ExitCode::from(1)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("policy_table_ocr=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract(args) => match run_extract(&args).await {
            Ok(report) => {
                log_report(&report, args.verbose);
                exit_for_count(report.row_count())
            }
            Err(error) => report_error(&error),
        },
        Commands::Column(args) => {
            run_column(&args).map_or_else(|error| report_error(&error), exit_for_count)
        }
        Commands::Import(args) => {
            run_import(&args).map_or_else(|error| report_error(&error), exit_for_count)
        }
        Commands::Preprocess(args) => match run_preprocess(&args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => report_error(&error),
        },
    }
}
