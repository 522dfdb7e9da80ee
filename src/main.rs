//! CLI entry point for UrbanGuard.
//!
//! Loads a predictions table and provides subcommands to inspect a node:
//! its map placement, its predicted vs. actual series, an error summary, and
//! a situational report for its largest anomaly.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::ffi::OsStr;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use urbanguard::{
    config::Config,
    dashboard,
    error::LoadError,
    loader::load_observations,
    observation::Dataset,
    output::{self, ReportRecord, append_record},
};

#[derive(Parser)]
#[command(name = "urbanguard")]
#[command(about = "Inspect traffic predictions per node and explain the largest anomaly", long_about = None)]
struct Cli {
    /// Predictions CSV (optionally .csv.gz); overrides URBANGUARD_DATA
    #[arg(short, long, global = true, value_name = "PATH")]
    data: Option<PathBuf>,

    /// Seed for cause selection; overrides URBANGUARD_SEED
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Text)]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List every node with its coordinates
    Nodes,
    /// Show the predicted vs. actual series for a node
    Series {
        #[arg(short, long)]
        node: i64,
    },
    /// Show the map layer with the selected node highlighted
    Map {
        /// Node to highlight (defaults to the first node)
        #[arg(short, long)]
        node: Option<i64>,
    },
    /// Explain the largest anomaly for a node
    Report {
        /// Node to inspect (defaults to the first node)
        #[arg(short, long)]
        node: Option<i64>,

        /// CSV file to append the generated report to
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Summarize prediction error for a node
    Summary {
        /// Node to inspect (defaults to the first node)
        #[arg(short, long)]
        node: Option<i64>,
    },
    /// Full dashboard view for a node
    Dashboard {
        /// Node to inspect (defaults to the first node)
        #[arg(short, long)]
        node: Option<i64>,
    },
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok(); // Load .env file

    // Config and logging come after parsing; --help touches neither.
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env()?;
    let _file_guard = init_tracing(&config.log_file_path)?;

    let data_path = cli.data.clone().unwrap_or(config.data_path);
    let seed = cli.seed.or(config.seed);

    let dataset = match load_observations(&data_path) {
        Ok(dataset) => dataset,
        Err(LoadError::NotFound { path }) => {
            error!(path = %path.display(), "Predictions file missing");
            anyhow::bail!(
                "`{}` not found. Make sure the predictions file exists or point --data at it.",
                path.display()
            );
        }
        Err(e) => return Err(e.into()),
    };

    let mut rng = match seed {
        Some(seed) => {
            info!(seed, "Using seeded cause selection");
            ChaCha8Rng::seed_from_u64(seed)
        }
        None => ChaCha8Rng::from_entropy(),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let json = cli.format == Format::Json;

    match cli.command {
        Commands::Nodes => {
            let locations = dataset.node_locations();
            if json {
                output::write_json(&mut out, &locations)?;
            } else {
                output::write_nodes(&mut out, &locations)?;
            }
        }
        Commands::Series { node } => {
            let node_id = dashboard::resolve_node(&dataset, Some(node))?;
            let series = dashboard::series(&dataset, node_id);
            if json {
                output::write_json(&mut out, &series)?;
            } else {
                output::write_series(&mut out, &series)?;
            }
        }
        Commands::Map { node } => {
            let node_id = dashboard::resolve_node(&dataset, node)?;
            let layer = dashboard::map_layer(&dataset, node_id);
            if json {
                output::write_json(&mut out, &layer)?;
            } else {
                output::write_map(&mut out, &layer)?;
            }
        }
        Commands::Report { node, output: log_path } => {
            report(&mut out, &dataset, node, log_path.as_deref(), json, &mut rng)?;
        }
        Commands::Summary { node } => {
            let node_id = dashboard::resolve_node(&dataset, node)?;
            let summary = dashboard::node_summary(&dataset, node_id);
            if json {
                output::write_json(&mut out, &summary)?;
            } else {
                output::write_summary(&mut out, &summary)?;
            }
        }
        Commands::Dashboard { node } => {
            let snapshot = dashboard::snapshot(&dataset, node, &mut rng)?;
            if json {
                output::write_json(&mut out, &snapshot)?;
            } else {
                output::write_dashboard(&mut out, &snapshot)?;
            }
        }
    }

    out.flush()?;
    Ok(())
}

/// Generates the report for a node and optionally appends it to a CSV log.
#[tracing::instrument(skip(out, dataset, json, rng))]
fn report<W: Write>(
    out: &mut W,
    dataset: &Dataset,
    node: Option<i64>,
    log_path: Option<&str>,
    json: bool,
    rng: &mut ChaCha8Rng,
) -> Result<()> {
    let node_id = dashboard::resolve_node(dataset, node)?;
    let report = dashboard::node_report(dataset, node_id, rng)?;

    info!(
        node_id,
        severity = %report.severity,
        error_percentage = report.error_percentage,
        "Situational report generated"
    );

    if json {
        output::write_json(out, &report)?;
    } else {
        output::write_report(out, &report)?;
    }

    if let Some(path) = log_path {
        append_record(path, &ReportRecord::from_report(&report))?;
        info!(path, "Report appended");
    }

    Ok(())
}

/// Logging setup: colored stderr + JSON rolling log file.
fn init_tracing(log_file_path: &Path) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = log_file_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = log_file_path
        .file_name()
        .unwrap_or(OsStr::new("urbanguard.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(guard)
}
