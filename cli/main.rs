#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

use clap::{Args, CommandFactory, Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use daycast::InputRecord;
use daycast::batch::{BatchReport, inputs_from_csv, inputs_from_json_str};
use daycast::config::{ConfigOverrides, ServiceConfig};
use daycast::engine::PredictionEngine;
use daycast::input::SalesInput;
use daycast::report::{ErrorReport, ForecastReport, HealthReport};

#[derive(Args)]
pub struct ServiceArgs {
    /// Optional TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the trained model artifact (.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub model: Option<PathBuf>,

    /// Path to the feature info document (.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub feature_info: Option<PathBuf>,

    /// Path to the training stats document (.json) holding residual_std
    #[arg(long, global = true, value_name = "PATH")]
    pub stats: Option<PathBuf>,

    /// Maximum number of inputs accepted by `batch`
    #[arg(long, global = true, value_name = "N")]
    pub max_batch: Option<usize>,
}

#[derive(Args)]
pub struct PredictArgs {
    /// JSON file with one day's sales attributes
    #[arg(long, value_name = "FILE")]
    pub input: PathBuf,

    /// Treat the input as a raw feature-name to value mapping and skip field validation
    #[arg(long)]
    pub raw: bool,
}

#[derive(Args)]
pub struct BatchArgs {
    /// JSON (array or {"predictions": [...]}) or CSV file with one input per row
    #[arg(long, value_name = "FILE")]
    pub input: PathBuf,

    /// Write per-item results to this TSV file instead of printing the JSON report
    #[arg(long, value_name = "TSV")]
    pub output: Option<PathBuf>,
}

#[derive(Parser)]
#[command(
    name = "daycast",
    about = "Daily revenue forecasts with 95% confidence intervals",
    long_about = "Loads a trained revenue model with its feature schema and residual statistics, \
                  aligns day-level sales attributes to the model's feature order, and reports \
                  point forecasts with symmetric 95% confidence intervals."
)]
struct Cli {
    #[command(flatten)]
    service: ServiceArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Report whether the model artifacts load
    #[command(about = "Readiness check (never fails on missing artifacts)")]
    Health,

    /// Forecast one day of revenue
    #[command(about = "Forecast one day (outputs: JSON forecast report)")]
    Predict(PredictArgs),

    /// Forecast many days at once
    #[command(about = "Forecast a batch of days (outputs: JSON batch report or TSV)")]
    Batch(BatchArgs),

    /// Show model name, metrics and feature list
    #[command(about = "Show model metadata")]
    Info,

    /// Show the fixed feature explanation table
    #[command(about = "Explain the business features")]
    Explain,

    /// Show every schema feature with its description, type and group
    #[command(about = "List the model's features")]
    Features,

    /// Display version and build information
    #[command(about = "Display version and build information")]
    Version,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let Cli { service, command } = cli;

    let result = match command {
        Some(Commands::Health) => run_health(&service),
        Some(Commands::Predict(args)) => run_predict(&service, args),
        Some(Commands::Batch(args)) => run_batch(&service, args),
        Some(Commands::Info) => run_info(&service),
        Some(Commands::Explain) => run_explain(&service),
        Some(Commands::Features) => run_features(&service),
        Some(Commands::Version) => {
            print_version_info();
            Ok(())
        }
        None => Cli::command()
            .print_help()
            .map(|()| println!())
            .map_err(Into::into),
    };

    if let Err(e) = result {
        let report = ErrorReport::from_error(e.as_ref());
        match serde_json::to_string_pretty(&report) {
            Ok(json) => eprintln!("{json}"),
            Err(_) => eprintln!("Error: {e}"),
        }
        process::exit(1);
    }
}

fn resolve_config(service: &ServiceArgs) -> Result<ServiceConfig, Box<dyn std::error::Error>> {
    let overrides = ConfigOverrides {
        model: service.model.clone(),
        feature_info: service.feature_info.clone(),
        training_stats: service.stats.clone(),
        max_batch: service.max_batch,
    };
    Ok(ServiceConfig::resolve(service.config.as_deref(), overrides)?)
}

/// Loads the artifacts; the returned engine is always `Ready`.
fn ready_engine(config: &ServiceConfig) -> Result<PredictionEngine, Box<dyn std::error::Error>> {
    let engine = PredictionEngine::new();
    engine.initialize(&config.artifacts)?;
    Ok(engine)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_health(service: &ServiceArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(service)?;
    let engine = PredictionEngine::new();
    if let Err(e) = engine.initialize(&config.artifacts) {
        log::error!("{e}");
    }
    print_json(&HealthReport::from_engine(&engine))
}

fn run_predict(service: &ServiceArgs, args: PredictArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(service)?;
    let text = fs::read_to_string(&args.input)?;
    let record: InputRecord = if args.raw {
        serde_json::from_str(&text)?
    } else {
        serde_json::from_str::<SalesInput>(&text)?.into_validated_record()?
    };

    let engine = ready_engine(&config)?;
    let result = engine.predict_with_interval(&record)?;
    let model_name = engine.model_info()?.model_name;
    print_json(&ForecastReport::new(&result, model_name))
}

fn run_batch(service: &ServiceArgs, args: BatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(service)?;
    let is_csv = args
        .input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    let inputs = if is_csv {
        inputs_from_csv(fs::File::open(&args.input)?)?
    } else {
        inputs_from_json_str(&fs::read_to_string(&args.input)?)?
    };
    log::info!("Read {} batch inputs from {}", inputs.len(), args.input.display());

    let engine = ready_engine(&config)?;
    let report = engine.predict_batch(&inputs, config.batch.max_items)?;

    match args.output {
        Some(path) => {
            save_batch_tsv(&report, &path)?;
            log::info!("Batch results saved to: {}", path.display());
            Ok(())
        }
        None => print_json(&report),
    }
}

/// Writes one row per batch item; failed items carry empty numeric cells.
fn save_batch_tsv(report: &BatchReport, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = csv::WriterBuilder::new().delimiter(b'\t').from_path(path)?;
    writer.write_record(["index", "predicted_revenue", "lower", "upper", "error"])?;
    for item in &report.results {
        let fmt = |value: Option<f64>| value.map(|v| format!("{v:.6}")).unwrap_or_default();
        writer.write_record([
            item.index.to_string(),
            fmt(item.predicted_revenue),
            fmt(item.confidence_interval.as_ref().map(|ci| ci.lower)),
            fmt(item.confidence_interval.as_ref().map(|ci| ci.upper)),
            item.error.clone().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn run_info(service: &ServiceArgs) -> Result<(), Box<dyn std::error::Error>> {
    let engine = ready_engine(&resolve_config(service)?)?;
    print_json(&engine.model_info()?)
}

fn run_explain(service: &ServiceArgs) -> Result<(), Box<dyn std::error::Error>> {
    let engine = ready_engine(&resolve_config(service)?)?;
    print_json(&serde_json::json!({
        "feature_explanations": engine.feature_explanations()?
    }))
}

fn run_features(service: &ServiceArgs) -> Result<(), Box<dyn std::error::Error>> {
    let engine = ready_engine(&resolve_config(service)?)?;
    print_json(&engine.feature_catalog()?)
}

/// Format seconds into a human-readable duration like "2.4 hours ago"
fn format_duration_ago(seconds: u64) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;

    if seconds < MINUTE {
        format!("{} seconds ago", seconds)
    } else if seconds < HOUR {
        format!("{:.1} minutes ago", seconds as f64 / MINUTE as f64)
    } else if seconds < DAY {
        format!("{:.1} hours ago", seconds as f64 / HOUR as f64)
    } else {
        format!("{:.1} days ago", seconds as f64 / DAY as f64)
    }
}

fn print_version_info() {
    let version = env!("CARGO_PKG_VERSION");
    let release_tag = option_env!("DAYCAST_RELEASE_TAG");
    let build_timestamp: u64 = env!("DAYCAST_BUILD_TIMESTAMP").parse().unwrap_or(0);

    println!("daycast {}", version);

    match release_tag {
        Some(tag) => println!("Release: {}", tag),
        None => println!("Release: development build"),
    }

    if build_timestamp > 0 {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        if now > build_timestamp {
            println!("Built: {}", format_duration_ago(now - build_timestamp));
        } else {
            println!("Built: just now");
        }
    }
}
