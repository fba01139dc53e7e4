//! Parameter sweep framework
//!
//! Grid search over strategy parameter combinations with parallel execution
//! using Rayon. Each combination is an independent simulation run over the
//! same candle series; runs share nothing mutable, so the sweep
//! parallelizes across runs while each run stays single-threaded.

use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use itertools::iproduct;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::backtest::Backtester;
use crate::config::GridParams;
use crate::grid::GridMode;
use crate::types::Candle;

/// Outcome of one sweep combination
#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub params: GridParams,
    pub profit_pct: f64,
    pub profit_usdt: f64,
    pub realized_profit: f64,
    pub fees_paid: f64,
    pub num_trades: usize,
}

/// Parameter combinations to test
#[derive(Debug, Clone)]
pub struct SweepGrid {
    pub num_grids: Vec<usize>,
    pub modes: Vec<GridMode>,
    pub fee_rates: Vec<f64>,
}

impl SweepGrid {
    /// Small set for a fast first look
    pub fn quick(base: &GridParams) -> Self {
        SweepGrid {
            num_grids: vec![10, 20, 40],
            modes: vec![GridMode::Arithmetic, GridMode::Geometric],
            fee_rates: vec![base.fee_rate],
        }
    }

    /// Wider scan across grid densities
    pub fn full(base: &GridParams) -> Self {
        SweepGrid {
            num_grids: vec![5, 10, 15, 20, 30, 40, 60, 80],
            modes: vec![GridMode::Arithmetic, GridMode::Geometric],
            fee_rates: vec![base.fee_rate],
        }
    }

    /// Expand into concrete parameter sets over the base configuration
    pub fn generate_params(&self, base: &GridParams) -> Vec<GridParams> {
        iproduct!(&self.num_grids, &self.modes, &self.fee_rates)
            .map(|(&num_grids, &grid_mode, &fee_rate)| GridParams {
                num_grids,
                grid_mode,
                fee_rate,
                ..base.clone()
            })
            .collect()
    }
}

/// Run every combination against the candle series, ranked by profit.
///
/// Combinations that fail validation are skipped with a warning rather than
/// aborting the sweep.
pub fn run_sweep(base: &GridParams, grid: &SweepGrid, candles: &[Candle]) -> Vec<SweepOutcome> {
    let combos = grid.generate_params(base);
    info!("Testing {} parameter combinations", combos.len());

    let bar = ProgressBar::new(combos.len() as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut outcomes: Vec<SweepOutcome> = combos
        .par_iter()
        .progress_with(bar)
        .filter_map(|params| {
            let engine = match Backtester::new(params.clone()) {
                Ok(engine) => engine,
                Err(err) => {
                    warn!(%err, "skipping invalid combination");
                    return None;
                }
            };
            let result = match engine.run(candles) {
                Ok(result) => result,
                Err(err) => {
                    warn!(%err, "skipping failed run");
                    return None;
                }
            };

            Some(SweepOutcome {
                params: params.clone(),
                profit_pct: result.profit_pct,
                profit_usdt: result.profit_usdt,
                realized_profit: result.realized_profit,
                fees_paid: result.fees_paid,
                num_trades: result.num_trades,
            })
        })
        .collect();

    outcomes.sort_by(|a, b| b.profit_pct.total_cmp(&a.profit_pct));
    outcomes
}
