//! Sweep command implementation
//!
//! Runs the parameter sweep over a candle series and prints the ranked
//! leaderboard.

use anyhow::{Context, Result};
use grid_backtest::sweep::{run_sweep, SweepGrid, SweepOutcome};
use grid_backtest::{data, GridParams};
use tracing::info;

pub fn run(params: GridParams, data_path: String, scope: String, top: usize) -> Result<()> {
    let candles = data::load_csv(&data_path)
        .context(format!("Failed to load candle data from {data_path}"))?;

    let grid = match scope.as_str() {
        "quick" => SweepGrid::quick(&params),
        "full" => SweepGrid::full(&params),
        other => anyhow::bail!("Unknown sweep scope: {other}. Available scopes: quick, full"),
    };

    info!(scope, "Starting parameter sweep");
    let outcomes = run_sweep(&params, &grid, &candles);

    if outcomes.is_empty() {
        anyhow::bail!("No sweep combination produced a result");
    }

    print_leaderboard(&outcomes, top);
    Ok(())
}

fn print_leaderboard(outcomes: &[SweepOutcome], top: usize) {
    println!("\n{}", "=".repeat(78));
    println!("SWEEP RESULTS (top {})", top.min(outcomes.len()));
    println!("{}", "=".repeat(78));
    println!(
        "{:<6} {:>8} {:>12} {:>12} {:>12} {:>10} {:>8}",
        "rank", "grids", "mode", "profit %", "profit", "fees", "trades"
    );

    for (rank, outcome) in outcomes.iter().take(top).enumerate() {
        println!(
            "{:<6} {:>8} {:>12} {:>12.2} {:>12.2} {:>10.2} {:>8}",
            rank + 1,
            outcome.params.num_grids,
            outcome.params.grid_mode.to_string(),
            outcome.profit_pct,
            outcome.profit_usdt,
            outcome.fees_paid,
            outcome.num_trades
        );
    }
    println!("{}", "=".repeat(78));
}
