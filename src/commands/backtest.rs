//! Backtest command implementation

use anyhow::{Context, Result};
use grid_backtest::{data, Backtester, GridParams};
use tracing::info;

use super::{print_summary, write_json};

pub fn run(params: GridParams, data_path: String, output: Option<String>) -> Result<()> {
    info!("Starting backtest");

    let candles = data::load_csv(&data_path)
        .context(format!("Failed to load candle data from {data_path}"))?;

    let engine = Backtester::new(params).context("Invalid grid parameters")?;
    let result = engine.run(&candles).context("Simulation failed")?;

    print_summary(&result);

    if let Some(path) = output {
        write_json(&result, path)?;
    }

    info!("Backtest completed successfully");
    Ok(())
}
