//! Backtesting engine
//!
//! Replays a grid strategy over an ordered candle series: per-candle side
//! reclassification, interpolated intrabar crossing detection, FIFO-backed
//! trade execution, and final mark-to-market aggregation.
//!
//! The run is a synchronous fold over the candles. Identical inputs always
//! produce an identical trade log; there is no randomness and no wall-clock
//! dependency beyond the timestamps carried by the candle data.

use tracing::{debug, info};

use crate::allocator::{allocate, Allocation};
use crate::config::GridParams;
use crate::grid::{generate_grid_lines, reclassify_sides, GridLevel, GridSide};
use crate::ledger::FifoLedger;
use crate::types::{Candle, Position, SimulationResult, TradeLogEntry, TradeType, ValidationError};

/// Grid backtest engine
///
/// Construction validates every parameter and fixes the grid lines for the
/// lifetime of the engine; `run` owns all mutable state per invocation, so
/// one engine can replay any number of candle series.
pub struct Backtester {
    params: GridParams,
    grid_lines: Vec<f64>,
}

/// Mutable state owned by a single run
struct RunState {
    position: Position,
    ledger: FifoLedger,
    levels: Vec<GridLevel>,
    trade_log: Vec<TradeLogEntry>,
    /// Index of the level that most recently executed a trade; stays
    /// blocked through reclassification until another level trades
    last_traded: Option<usize>,
}

impl Backtester {
    /// Validate parameters and fix the grid ladder.
    ///
    /// Out-of-domain parameters abort here, before any candle is touched.
    pub fn new(params: GridParams) -> Result<Self, ValidationError> {
        params.validate()?;
        let grid_lines = generate_grid_lines(
            params.lower_price,
            params.upper_price,
            params.num_grids,
            params.grid_mode,
        )?;

        Ok(Backtester { params, grid_lines })
    }

    pub fn grid_lines(&self) -> &[f64] {
        &self.grid_lines
    }

    pub fn params(&self) -> &GridParams {
        &self.params
    }

    /// Replay the strategy over the candle series.
    ///
    /// The first candle's close seeds the allocation and serves as the
    /// first reference price; trading starts with the second candle.
    pub fn run(&self, candles: &[Candle]) -> Result<SimulationResult, ValidationError> {
        let first = candles.first().ok_or(ValidationError::EmptyCandleSeries)?;
        let initial_price = first.close;

        let Allocation {
            position,
            ledger,
            levels,
            initial_coin,
            seed_fee,
        } = allocate(&self.params, &self.grid_lines, initial_price, first.timestamp);

        info!(
            initial_price,
            num_levels = levels.len(),
            candles = candles.len(),
            "starting grid simulation"
        );

        let initial_position = position;
        let mut state = RunState {
            position,
            ledger,
            levels,
            trade_log: Vec::new(),
            last_traded: None,
        };

        let mut prev_close = initial_price;
        for candle in &candles[1..] {
            reclassify_sides(&mut state.levels, prev_close, state.last_traded);
            self.process_candle(&mut state, prev_close, candle);
            prev_close = candle.close;
        }

        let final_price = candles
            .last()
            .map(|c| c.close)
            .unwrap_or(initial_price);

        Ok(self.aggregate(
            state,
            initial_position,
            initial_coin,
            seed_fee,
            initial_price,
            final_price,
        ))
    }

    /// Walk the interpolated price path of one candle and fire every level
    /// the path crosses in the direction matching its side.
    ///
    /// Each executed level flips to `Blocked`, so no level trades more than
    /// once per candle.
    fn process_candle(&self, state: &mut RunState, prev_close: f64, candle: &Candle) {
        let current_close = candle.close;
        let samples = self.params.path_samples;
        let step = (current_close - prev_close) / (samples - 1) as f64;

        for j in 1..samples {
            let seg_start = prev_close + step * (j - 1) as f64;
            let seg_end = prev_close + step * j as f64;

            for idx in 0..state.levels.len() {
                let level_price = state.levels[idx].price;
                let executed = match state.levels[idx].side {
                    GridSide::Sell if seg_start < level_price && level_price < seg_end => {
                        self.execute_sell(state, idx, candle)
                    }
                    GridSide::Buy if seg_start > level_price && level_price > seg_end => {
                        self.execute_buy(state, idx, candle)
                    }
                    _ => false,
                };

                if executed {
                    state.levels[idx].side = GridSide::Blocked;
                    state.last_traded = Some(idx);
                }
            }
        }
    }

    /// Sell the level's fixed amount against FIFO inventory.
    ///
    /// Insufficient inventory is not an error: the level simply does not
    /// fire, mirroring an exchange rejecting an order it cannot fill.
    fn execute_sell(&self, state: &mut RunState, idx: usize, candle: &Candle) -> bool {
        let level = &state.levels[idx];
        let amount = level.trade_amount;
        let price = level.price;

        let Some(gross_profit) = state.ledger.consume(amount, price) else {
            debug!(
                grid_price = price,
                amount,
                available = state.ledger.total_amount(),
                "sell skipped: insufficient inventory"
            );
            return false;
        };

        let fee = amount * price * self.params.fee_rate;
        state.position.usdt_balance += amount * price - fee;
        state.position.coin_balance -= amount;

        state.trade_log.push(TradeLogEntry {
            timestamp: candle.timestamp,
            trade_type: TradeType::Sell,
            trigger_price: candle.close,
            grid_price: price,
            amount,
            fee,
            realized_profit: gross_profit - fee,
            inventory_depth: state.ledger.depth(),
        });

        debug!(grid_price = price, amount, fee, "sell executed");
        true
    }

    /// Buy the level's fixed amount if the quote balance covers cost plus
    /// fee; append the purchase as a new FIFO lot.
    fn execute_buy(&self, state: &mut RunState, idx: usize, candle: &Candle) -> bool {
        let level = &state.levels[idx];
        let amount = level.trade_amount;
        let price = level.price;

        let required_usdt = amount * price * (1.0 + self.params.fee_rate);
        if state.position.usdt_balance < required_usdt {
            debug!(
                grid_price = price,
                required_usdt,
                available = state.position.usdt_balance,
                "buy skipped: insufficient balance"
            );
            return false;
        }

        let fee = amount * price * self.params.fee_rate;
        state.position.usdt_balance -= required_usdt;
        state.position.coin_balance += amount;
        state.ledger.append(amount, price, candle.timestamp);

        state.trade_log.push(TradeLogEntry {
            timestamp: candle.timestamp,
            trade_type: TradeType::Buy,
            trigger_price: candle.close,
            grid_price: price,
            amount,
            fee,
            realized_profit: 0.0,
            inventory_depth: state.ledger.depth(),
        });

        debug!(grid_price = price, amount, fee, "buy executed");
        true
    }

    /// Final valuation and summary statistics
    fn aggregate(
        &self,
        state: RunState,
        initial_position: Position,
        initial_coin: f64,
        seed_fee: f64,
        initial_price: f64,
        final_price: f64,
    ) -> SimulationResult {
        let total_investment = self.params.total_investment;
        let final_value = state.position.value_at(final_price);
        let profit_usdt = final_value - total_investment;
        let realized_profit: f64 = state.trade_log.iter().map(|t| t.realized_profit).sum();
        let fees_paid: f64 = state.trade_log.iter().map(|t| t.fee).sum();

        info!(
            final_value,
            profit_usdt,
            num_trades = state.trade_log.len(),
            "simulation complete"
        );

        SimulationResult {
            initial_investment: total_investment,
            final_value,
            profit_usdt,
            profit_pct: profit_usdt / total_investment * 100.0,
            realized_profit,
            floating_profit: profit_usdt - realized_profit,
            fees_paid,
            num_trades: state.trade_log.len(),
            trade_log: state.trade_log,
            grid_lines: self.grid_lines.clone(),
            initial_position,
            final_position: state.position,
            initial_coin,
            seed_fee,
            initial_price,
            final_price,
            price_change_pct: (final_price - initial_price) / initial_price * 100.0,
        }
    }
}
