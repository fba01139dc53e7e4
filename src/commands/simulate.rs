//! Simulate command implementation
//!
//! Runs the engine against a deterministic synthetic price pattern, useful
//! for checking grid mechanics without market data.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use grid_backtest::data::{generate_pattern, PricePattern};
use grid_backtest::{Backtester, GridParams};
use tracing::info;

use super::{print_summary, write_json};

#[allow(clippy::too_many_arguments)]
pub fn run(
    params: GridParams,
    pattern: String,
    periods: usize,
    start_price: f64,
    amplitude: f64,
    start_date: String,
    output: Option<String>,
) -> Result<()> {
    let pattern: PricePattern = pattern
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
        .context("Invalid pattern")?;

    let start = parse_start_date(&start_date)?;

    info!(%pattern, periods, start_price, "Generating synthetic series");
    let candles = generate_pattern(pattern, periods, start_price, amplitude, start);

    let engine = Backtester::new(params).context("Invalid grid parameters")?;
    let result = engine.run(&candles).context("Simulation failed")?;

    print_summary(&result);

    if let Some(path) = output {
        write_json(&result, path)?;
    }

    Ok(())
}

fn parse_start_date(s: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .context(format!("Failed to parse start date: {s} (expected YYYY-MM-DD)"))?;
    let naive = date
        .and_hms_opt(0, 0, 0)
        .context("Invalid start-of-day time")?;
    Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
}
