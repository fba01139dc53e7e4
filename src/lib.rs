//! Grid Trading Backtester
//!
//! A deterministic backtesting engine for grid trading strategies: fixed
//! grid ladder, one-time capital allocation, FIFO cost-basis accounting,
//! and intrabar crossing detection over an interpolated price path.

pub mod allocator;
pub mod backtest;
pub mod config;
pub mod data;
pub mod grid;
pub mod ledger;
pub mod sweep;
pub mod types;

pub use backtest::Backtester;
pub use config::{Config, GridParams};
pub use grid::{GridLevel, GridMode, GridSide};
pub use ledger::{FifoLedger, Lot};
pub use types::*;
