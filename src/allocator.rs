//! One-time capital allocation
//!
//! Runs once at the start of a simulation: seeds standing coin inventory
//! with half the investment, sizes every grid level with a fixed coin
//! amount, and tags each level's starting side against the initial price.
//!
//! A live grid bot only ever places a sell order for coin it already holds;
//! the seed purchase replicates that precondition so sell-side levels above
//! the entry price have inventory to sell from the first candle on.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::GridParams;
use crate::grid::{classify, GridLevel};
use crate::ledger::FifoLedger;
use crate::types::Position;

/// Fraction of the investment converted to coin up front
const SEED_FRACTION: f64 = 0.5;

/// Fraction of the investment distributed across grid levels; the remaining
/// 1% is held back as buffer against fee rounding
const GRID_CAPITAL_FRACTION: f64 = 0.99;

/// Initial state produced by the allocator
#[derive(Debug, Clone)]
pub struct Allocation {
    pub position: Position,
    pub ledger: FifoLedger,
    pub levels: Vec<GridLevel>,
    /// Coin bought by the seed purchase
    pub initial_coin: f64,
    /// Fee charged on the seed purchase; not a grid event, so it never
    /// appears in the trade log
    pub seed_fee: f64,
}

/// Allocate starting capital across the grid.
///
/// `grid_lines` must be the validated, strictly ascending level prices and
/// `initial_price` the first candle's close.
pub fn allocate(
    params: &GridParams,
    grid_lines: &[f64],
    initial_price: f64,
    timestamp: DateTime<Utc>,
) -> Allocation {
    let mut position = Position::new(params.total_investment);
    let mut ledger = FifoLedger::new();

    // Seed purchase: half the investment becomes standing inventory. The
    // amount is sized so cost plus fee equals the seed budget exactly.
    let seed_budget = params.total_investment * SEED_FRACTION;
    let initial_coin = seed_budget / (initial_price * (1.0 + params.fee_rate));
    let seed_fee = initial_coin * initial_price * params.fee_rate;

    position.usdt_balance -= initial_coin * initial_price + seed_fee;
    position.coin_balance += initial_coin;
    ledger.append(initial_coin, initial_price, timestamp);

    debug!(
        initial_coin,
        seed_fee, initial_price, "seed purchase executed"
    );

    // Uniform quote notional per level; the fixed coin amount per level
    // follows from the level's own price so every trade at that level moves
    // the same quantity.
    let notional = params.total_investment * GRID_CAPITAL_FRACTION / params.num_grids as f64;
    let levels = grid_lines
        .iter()
        .map(|&price| GridLevel {
            price,
            side: classify(price, initial_price),
            trade_amount: notional / (price * (1.0 + params.fee_rate)),
        })
        .collect();

    Allocation {
        position,
        ledger,
        levels,
        initial_coin,
        seed_fee,
    }
}
