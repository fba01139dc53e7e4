//! Grid backtester - main entry point
//!
//! This binary provides three subcommands:
//! - backtest: Replay the grid strategy over a CSV candle series
//! - simulate: Replay over a deterministic synthetic price pattern
//! - sweep: Grid-search strategy parameters in parallel

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use grid_backtest::{Config, GridParams};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "grid-backtest")]
#[command(about = "Deterministic grid trading backtester with FIFO accounting", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Strategy parameters shared by every subcommand; CLI flags override the
/// config file, which overrides the built-in defaults
#[derive(Args, Debug)]
struct GridArgs {
    /// Path to JSON configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Total investment in quote currency
    #[arg(long)]
    investment: Option<f64>,

    /// Lower grid bound
    #[arg(long)]
    lower: Option<f64>,

    /// Upper grid bound
    #[arg(long)]
    upper: Option<f64>,

    /// Number of grid intervals
    #[arg(long)]
    grids: Option<usize>,

    /// Grid spacing mode (arithmetic or geometric)
    #[arg(long)]
    mode: Option<String>,

    /// Fee rate as a fraction, e.g. 0.001
    #[arg(long)]
    fee: Option<f64>,

    /// Interpolated points per candle for crossing detection
    #[arg(long)]
    samples: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay the grid strategy over a CSV candle series
    Backtest {
        #[command(flatten)]
        grid: GridArgs,

        /// Path to CSV candle data (overrides config)
        #[arg(short, long)]
        data: Option<String>,

        /// Write the full result as JSON to this path
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Replay over a deterministic synthetic price pattern
    Simulate {
        #[command(flatten)]
        grid: GridArgs,

        /// Pattern: linear_up, linear_down, sine, range_bound, breakout
        #[arg(short, long, default_value = "sine")]
        pattern: String,

        /// Number of hourly candles to generate
        #[arg(long, default_value = "168")]
        periods: usize,

        /// First close of the generated series
        #[arg(long, default_value = "100.0")]
        start_price: f64,

        /// Price excursion scale of the pattern
        #[arg(long, default_value = "10.0")]
        amplitude: f64,

        /// Series start date (YYYY-MM-DD)
        #[arg(long, default_value = "2024-01-01")]
        start_date: String,

        /// Write the full result as JSON to this path
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Grid-search strategy parameters in parallel
    Sweep {
        #[command(flatten)]
        grid: GridArgs,

        /// Path to CSV candle data (overrides config)
        #[arg(short, long)]
        data: Option<String>,

        /// Sweep scope (quick or full)
        #[arg(long, default_value = "quick")]
        scope: String,

        /// Number of top results to show
        #[arg(short, long, default_value = "10")]
        top: usize,
    },
}

/// Merge defaults, config file, and CLI overrides into final parameters.
/// Returns the parameters plus the config's data path, if any.
fn resolve_params(args: &GridArgs) -> Result<(GridParams, Option<String>)> {
    let (mut params, csv_path) = match &args.config {
        Some(path) => {
            let config = Config::from_file(path)?;
            info!("Loaded configuration from: {}", path);
            (config.grid, config.data.csv_path)
        }
        None => (GridParams::default(), None),
    };

    if let Some(investment) = args.investment {
        params.total_investment = investment;
    }
    if let Some(lower) = args.lower {
        params.lower_price = lower;
    }
    if let Some(upper) = args.upper {
        params.upper_price = upper;
    }
    if let Some(grids) = args.grids {
        params.num_grids = grids;
    }
    if let Some(mode) = &args.mode {
        params.grid_mode = mode.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    }
    if let Some(fee) = args.fee {
        params.fee_rate = fee;
    }
    if let Some(samples) = args.samples {
        params.path_samples = samples;
    }

    Ok((params, csv_path))
}

fn require_data(cli_data: Option<String>, config_data: Option<String>) -> Result<String> {
    cli_data
        .or(config_data)
        .ok_or_else(|| anyhow::anyhow!("No candle data given: pass --data or set data.csv_path in the config"))
}

fn setup_logging(verbose: bool, command_name: &str, file_only: bool) -> Result<()> {
    // Create logs directory
    std::fs::create_dir_all("logs")?;

    // Create log file with naming pattern: {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    let level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // File appender
    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    if file_only {
        // For the sweep: only log to file, keep console clean for the
        // progress bar
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .init();
    } else {
        let console_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(true);

        // File layer - same format but without ANSI colors
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        info!("Logging initialized");
        info!("Log file: {}", log_path.display());
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // File-only logging for the sweep keeps the progress bar readable
    let (command_name, file_only) = match &cli.command {
        Commands::Backtest { .. } => ("backtest", false),
        Commands::Simulate { .. } => ("simulate", false),
        Commands::Sweep { .. } => ("sweep", true),
    };

    setup_logging(cli.verbose, command_name, file_only)?;

    match cli.command {
        Commands::Backtest { grid, data, output } => {
            let (params, csv_path) = resolve_params(&grid)?;
            let data_path = require_data(data, csv_path)?;
            commands::backtest::run(params, data_path, output)
        }

        Commands::Simulate {
            grid,
            pattern,
            periods,
            start_price,
            amplitude,
            start_date,
            output,
        } => {
            let (params, _) = resolve_params(&grid)?;
            commands::simulate::run(
                params,
                pattern,
                periods,
                start_price,
                amplitude,
                start_date,
                output,
            )
        }

        Commands::Sweep {
            grid,
            data,
            scope,
            top,
        } => {
            let (params, csv_path) = resolve_params(&grid)?;
            let data_path = require_data(data, csv_path)?;
            commands::sweep::run(params, data_path, scope, top)
        }
    }
}
