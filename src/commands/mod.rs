//! Subcommand implementations

pub mod backtest;
pub mod simulate;
pub mod sweep;

use anyhow::{Context, Result};
use grid_backtest::SimulationResult;
use std::path::Path;
use tracing::info;

/// Render the run summary to stdout
pub(crate) fn print_summary(result: &SimulationResult) {
    println!("\n{}", "=".repeat(60));
    println!("GRID BACKTEST RESULTS");
    println!("{}", "=".repeat(60));
    println!("Initial Investment: {:>14.2} USDT", result.initial_investment);
    println!("Final Value:        {:>14.2} USDT", result.final_value);
    println!("Profit:             {:>14.2} USDT ({:+.2}%)", result.profit_usdt, result.profit_pct);
    println!("  Realized (grid):  {:>14.2} USDT", result.realized_profit);
    println!("  Floating:         {:>14.2} USDT", result.floating_profit);
    println!("Fees Paid:          {:>14.2} USDT", result.fees_paid);
    println!("Seed Purchase:      {:>14.8} coin (fee {:.2} USDT)", result.initial_coin, result.seed_fee);
    println!("Trades Executed:    {:>14}", result.num_trades);
    println!("Grid Levels:        {:>14}", result.grid_lines.len());
    println!("Initial Price:      {:>14.2}", result.initial_price);
    println!("Final Price:        {:>14.2} ({:+.2}%)", result.final_price, result.price_change_pct);
    println!(
        "Final Position:     {:>14.2} USDT / {:.8} coin",
        result.final_position.usdt_balance, result.final_position.coin_balance
    );
    println!("{}", "=".repeat(60));
}

/// Write the full result as pretty JSON
pub(crate) fn write_json(result: &SimulationResult, path: impl AsRef<Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(result).context("Failed to serialize result")?;
    std::fs::write(path.as_ref(), json)
        .context(format!("Failed to write {}", path.as_ref().display()))?;
    info!("Result written to {}", path.as_ref().display());
    Ok(())
}
