//! CLI definition and dispatch.

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_result_adapter::JsonResultAdapter;
use crate::adapters::json_store_adapter::JsonStoreAdapter;
use crate::domain::column_resolver::{resolve, ColumnBinding};
use crate::domain::config_validation::{build_backtest_params, build_optimize_params};
use crate::domain::contract::{BacktestRequest, OptimizeRequest, RankedRun};
use crate::domain::drawdown::{derive_drawdowns, max_drawdown, DrawdownPoint};
use crate::domain::error::IngestError;
use crate::domain::normalizer::{normalize_with_report, NormalizeReport};
use crate::domain::persistence::{persistence_key, PersistenceRecord};
use crate::domain::series::Series;
use crate::ports::backtest_port::BacktestPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::result_store_port::ResultStorePort;
use crate::ports::table_port::TablePort;

#[derive(Parser, Debug)]
#[command(name = "tabseries", about = "Tabular price-series ingestion and drawdowns")]
pub struct Cli {
    /// Log at info level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show detected columns, row counts and date range of a table
    Inspect {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long)]
        delimiter: Option<String>,
    },
    /// Print the normalized price series
    Series {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long)]
        delimiter: Option<String>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
    },
    /// Print the drawdown series of a price table or a saved equity curve
    Drawdown {
        #[arg(short, long, required_unless_present = "result", conflicts_with = "result")]
        input: Option<PathBuf>,
        #[arg(short, long)]
        result: Option<PathBuf>,
        #[arg(long)]
        delimiter: Option<String>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
    },
    /// Build a backtest request from a table and a config file
    Request {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run a backtest against a saved engine response and store its summary
    SaveResult {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        result: PathBuf,
        #[arg(long)]
        asset: String,
        #[arg(long)]
        period: String,
    },
    /// Build a grid-search request from a table and the [optimize] section
    OptimizeRequest {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run a grid search against a saved engine response and print the ranking
    Optimize {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        result: PathBuf,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
    },
}

pub fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Inspect { input, delimiter } => run_inspect(&input, delimiter.as_deref()),
        Command::Series {
            input,
            delimiter,
            format,
        } => run_series(&input, delimiter.as_deref(), format),
        Command::Drawdown {
            input,
            result,
            delimiter,
            format,
        } => run_drawdown(input.as_ref(), result.as_ref(), delimiter.as_deref(), format),
        Command::Request {
            input,
            config,
            output,
        } => run_request(&input, &config, output.as_ref()),
        Command::SaveResult {
            input,
            config,
            result,
            asset,
            period,
        } => run_save_result(&input, &config, &result, &asset, &period),
        Command::OptimizeRequest {
            input,
            config,
            output,
        } => run_optimize_request(&input, &config, output.as_ref()),
        Command::Optimize {
            input,
            config,
            result,
            format,
        } => run_optimize(&input, &config, &result, format),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// A normalized table together with how it was read.
#[derive(Debug)]
pub struct LoadedSeries {
    pub binding: ColumnBinding,
    pub series: Series,
    pub report: NormalizeReport,
}

/// Read, resolve and normalize a table file.
pub fn load_series(table_port: &dyn TablePort, path: &Path) -> Result<LoadedSeries, IngestError> {
    let table = table_port.load_table(path)?;
    let binding = resolve(&table.headers)?;
    let (series, report) = normalize_with_report(&table, &binding)?;
    Ok(LoadedSeries {
        binding,
        series,
        report,
    })
}

/// CLI flag wins over `[input] delimiter`; default is a comma.
pub fn resolve_delimiter(
    flag: Option<&str>,
    config: Option<&dyn ConfigPort>,
) -> Result<u8, IngestError> {
    let requested = match flag {
        Some(s) => Some(s.to_string()),
        None => config.and_then(|c| c.get_non_empty("input", "delimiter")),
    };
    match requested {
        None => Ok(b','),
        Some(s) => CsvAdapter::parse_delimiter(&s).ok_or_else(|| IngestError::ConfigInvalid {
            section: "input".into(),
            key: "delimiter".into(),
            reason: format!("unsupported delimiter {s:?}"),
        }),
    }
}

pub fn build_request(
    loaded: &LoadedSeries,
    config: &dyn ConfigPort,
) -> Result<BacktestRequest, IngestError> {
    let params = build_backtest_params(config)?;
    if loaded.series.within(params.start_date, params.end_date).is_none() {
        eprintln!("warning: no rows fall within the configured start_date/end_date");
    }
    Ok(BacktestRequest::new(&loaded.series, params))
}

pub fn build_optimize_request(
    loaded: &LoadedSeries,
    config: &dyn ConfigPort,
) -> Result<OptimizeRequest, IngestError> {
    let params = build_optimize_params(config)?;
    if loaded.series.within(params.start_date, params.end_date).is_none() {
        eprintln!("warning: no rows fall within the configured start_date/end_date");
    }
    Ok(OptimizeRequest::new(&loaded.series, params))
}

/// Run `request` on `engine` and file the summary in `store` under the key
/// derived from `asset` and `period`. Returns the key.
pub fn save_run_summary(
    engine: &dyn BacktestPort,
    store: &dyn ResultStorePort,
    request: &BacktestRequest,
    asset: &str,
    period: &str,
) -> Result<String, IngestError> {
    let result = engine.run(request)?;
    let record = PersistenceRecord::from_run(&request.params, &result);
    let key = persistence_key(asset, period);
    store.save(&key, &record)?;
    Ok(key)
}

pub fn write_series<W: Write>(
    out: W,
    series: &Series,
    format: OutputFormat,
) -> Result<(), IngestError> {
    write_records(out, &series.to_price_records(), format)
}

pub fn write_drawdowns<W: Write>(
    out: W,
    drawdowns: &[DrawdownPoint],
    format: OutputFormat,
) -> Result<(), IngestError> {
    write_records(out, drawdowns, format)
}

pub fn write_ranking<W: Write>(
    out: W,
    ranking: &[RankedRun],
    format: OutputFormat,
) -> Result<(), IngestError> {
    write_records(out, ranking, format)
}

fn write_records<W: Write, T: serde::Serialize>(
    mut out: W,
    records: &[T],
    format: OutputFormat,
) -> Result<(), IngestError> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, records)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(out);
            for record in records {
                wtr.serialize(record).map_err(|e| IngestError::Io(io::Error::other(e)))?;
            }
            wtr.flush()?;
        }
    }
    Ok(())
}

fn run_inspect(input: &Path, delimiter: Option<&str>) -> Result<(), IngestError> {
    let adapter = CsvAdapter::new(resolve_delimiter(delimiter, None)?);
    eprintln!("Reading {}", input.display());
    let loaded = load_series(&adapter, input)?;
    let (start, end) = loaded.series.date_range();

    eprintln!("Date column:   {}", loaded.binding.date_column);
    eprintln!("Price column:  {}", loaded.binding.price_column);
    eprintln!("Rows kept:     {}", loaded.report.kept);
    eprintln!(
        "Rows skipped:  {} (missing cell {}, invalid date {}, invalid price {})",
        loaded.report.skipped(),
        loaded.report.missing_cell,
        loaded.report.invalid_date,
        loaded.report.invalid_price,
    );
    eprintln!("Date range:    {} to {}", start, end);
    Ok(())
}

fn run_series(
    input: &Path,
    delimiter: Option<&str>,
    format: OutputFormat,
) -> Result<(), IngestError> {
    let adapter = CsvAdapter::new(resolve_delimiter(delimiter, None)?);
    let loaded = load_series(&adapter, input)?;
    write_series(io::stdout().lock(), &loaded.series, format)
}

fn run_drawdown(
    input: Option<&PathBuf>,
    result: Option<&PathBuf>,
    delimiter: Option<&str>,
    format: OutputFormat,
) -> Result<(), IngestError> {
    let drawdowns = match (input, result) {
        (_, Some(result_path)) => {
            let result = JsonResultAdapter::new(result_path.clone()).load()?;
            derive_drawdowns(&result.equity_curve)
        }
        (Some(input), None) => {
            let adapter = CsvAdapter::new(resolve_delimiter(delimiter, None)?);
            let loaded = load_series(&adapter, input)?;
            derive_drawdowns(loaded.series.points())
        }
        (None, None) => {
            return Err(IngestError::Io(io::Error::other(
                "either --input or --result is required",
            )));
        }
    };

    eprintln!("Max drawdown: -{:.2}%", max_drawdown(&drawdowns) * 100.0);
    write_drawdowns(io::stdout().lock(), &drawdowns, format)
}

fn run_request(
    input: &Path,
    config_path: &Path,
    output: Option<&PathBuf>,
) -> Result<(), IngestError> {
    eprintln!("Loading config from {}", config_path.display());
    let config = FileConfigAdapter::from_file(config_path)?;
    let adapter = CsvAdapter::new(resolve_delimiter(None, Some(&config as &dyn ConfigPort))?);
    let loaded = load_series(&adapter, input)?;
    let request = build_request(&loaded, &config)?;

    let json = serde_json::to_string_pretty(&request)?;
    match output {
        Some(path) => {
            fs::write(path, json)?;
            eprintln!("Request written to: {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_save_result(
    input: &Path,
    config_path: &Path,
    result_path: &Path,
    asset: &str,
    period: &str,
) -> Result<(), IngestError> {
    eprintln!("Loading config from {}", config_path.display());
    let config = FileConfigAdapter::from_file(config_path)?;
    let store_path = config.get_non_empty("storage", "path").ok_or_else(|| {
        IngestError::ConfigMissing {
            section: "storage".into(),
            key: "path".into(),
        }
    })?;

    let adapter = CsvAdapter::new(resolve_delimiter(None, Some(&config as &dyn ConfigPort))?);
    let loaded = load_series(&adapter, input)?;
    let request = build_request(&loaded, &config)?;

    let engine = JsonResultAdapter::new(result_path.to_path_buf());
    let store = JsonStoreAdapter::new(PathBuf::from(store_path));
    let key = save_run_summary(&engine, &store, &request, asset, period)?;
    eprintln!("Saved {key}");
    Ok(())
}

fn run_optimize_request(
    input: &Path,
    config_path: &Path,
    output: Option<&PathBuf>,
) -> Result<(), IngestError> {
    eprintln!("Loading config from {}", config_path.display());
    let config = FileConfigAdapter::from_file(config_path)?;
    let adapter = CsvAdapter::new(resolve_delimiter(None, Some(&config as &dyn ConfigPort))?);
    let loaded = load_series(&adapter, input)?;
    let request = build_optimize_request(&loaded, &config)?;

    let json = serde_json::to_string_pretty(&request)?;
    match output {
        Some(path) => {
            fs::write(path, json)?;
            eprintln!("Optimization request written to: {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_optimize(
    input: &Path,
    config_path: &Path,
    result_path: &Path,
    format: OutputFormat,
) -> Result<(), IngestError> {
    eprintln!("Loading config from {}", config_path.display());
    let config = FileConfigAdapter::from_file(config_path)?;
    let adapter = CsvAdapter::new(resolve_delimiter(None, Some(&config as &dyn ConfigPort))?);
    let loaded = load_series(&adapter, input)?;
    let request = build_optimize_request(&loaded, &config)?;

    let engine = JsonResultAdapter::new(result_path.to_path_buf());
    let result = engine.optimize(&request)?;
    eprintln!(
        "Tested {} combinations, {} valid",
        result.total_tested, result.valid_results
    );
    write_ranking(io::stdout().lock(), &result.top_results, format)
}
