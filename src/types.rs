//! Core data types used across the backtester

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tolerance for ledger bookkeeping. A lot whose remaining amount falls
/// below this is considered fully consumed.
pub const AMOUNT_EPSILON: f64 = 1e-8;

/// Configuration errors raised before any simulation step
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("upper price ({upper}) must be > lower price ({lower})")]
    InvertedBounds { lower: f64, upper: f64 },

    #[error("prices must be positive: lower={lower}, upper={upper}")]
    NonPositiveBounds { lower: f64, upper: f64 },

    #[error("minimum 2 grid levels required, got {0}")]
    TooFewGrids(usize),

    #[error("fee rate ({0}) must be in [0, 0.1)")]
    FeeRateOutOfRange(f64),

    #[error("total investment ({0}) must be > 0")]
    NonPositiveInvestment(f64),

    #[error("path sample count must be >= 2, got {0}")]
    TooFewPathSamples(usize),

    #[error("candle series is empty")]
    EmptyCandleSeries,
}

/// Validation errors for candle data
#[derive(Debug, Error)]
pub enum CandleValidationError {
    #[error("high ({high}) must be >= low ({low})")]
    HighLessThanLow { high: f64, low: f64 },

    #[error("volume ({0}) must be >= 0")]
    NegativeVolume(f64),

    #[error("close ({close}) must be between low ({low}) and high ({high})")]
    CloseOutOfRange { close: f64, low: f64, high: f64 },

    #[error("prices must be positive: open={open}, high={high}, low={low}, close={close}")]
    NonPositivePrice {
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },
}

/// OHLCV candlestick data
///
/// The engine only ever reads `close`; the remaining fields are carried for
/// data fidelity. Using close-to-close interpolation instead of the full
/// high/low range is a documented limitation of the path model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Create a new candle with validation
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, CandleValidationError> {
        let candle = Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        };
        candle.validate()?;
        Ok(candle)
    }

    /// Validate the candle data
    pub fn validate(&self) -> Result<(), CandleValidationError> {
        if self.open <= 0.0 || self.high <= 0.0 || self.low <= 0.0 || self.close <= 0.0 {
            return Err(CandleValidationError::NonPositivePrice {
                open: self.open,
                high: self.high,
                low: self.low,
                close: self.close,
            });
        }

        if self.high < self.low {
            return Err(CandleValidationError::HighLessThanLow {
                high: self.high,
                low: self.low,
            });
        }

        if self.volume < 0.0 {
            return Err(CandleValidationError::NegativeVolume(self.volume));
        }

        if self.close < self.low || self.close > self.high {
            return Err(CandleValidationError::CloseOutOfRange {
                close: self.close,
                low: self.low,
                high: self.high,
            });
        }

        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeType {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeType::Buy => write!(f, "BUY"),
            TradeType::Sell => write!(f, "SELL"),
        }
    }
}

/// Quote and base balances held by one simulation run
///
/// Both balances stay >= 0 at all times; a trade that would violate this is
/// rejected as a no-op, never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub usdt_balance: f64,
    pub coin_balance: f64,
}

impl Position {
    pub fn new(usdt_balance: f64) -> Self {
        Position {
            usdt_balance,
            coin_balance: 0.0,
        }
    }

    /// Mark-to-market value at the given price
    pub fn value_at(&self, price: f64) -> f64 {
        self.usdt_balance + self.coin_balance * price
    }
}

/// One executed grid trade, append-only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeLogEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub trade_type: TradeType,
    /// Close of the candle during which the trade fired
    pub trigger_price: f64,
    /// The grid level the trade executed at
    pub grid_price: f64,
    pub amount: f64,
    pub fee: f64,
    /// FIFO realized profit net of the sell fee; zero for buys
    pub realized_profit: f64,
    /// Open lots remaining after the trade
    pub inventory_depth: usize,
}

/// Aggregate outcome of one simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub initial_investment: f64,
    pub final_value: f64,
    /// Mark-to-market profit: final value minus initial investment
    pub profit_usdt: f64,
    pub profit_pct: f64,
    /// FIFO profit realized by grid sells, net of sell fees
    pub realized_profit: f64,
    /// Mark-to-market profit not yet realized by a sell
    pub floating_profit: f64,
    /// Fees summed over the trade log (the seed fee is reported separately)
    pub fees_paid: f64,
    pub num_trades: usize,
    pub trade_log: Vec<TradeLogEntry>,
    pub grid_lines: Vec<f64>,
    pub initial_position: Position,
    pub final_position: Position,
    /// Coin bought by the one-time seed purchase
    pub initial_coin: f64,
    /// Fee charged on the seed purchase, not part of `fees_paid`
    pub seed_fee: f64,
    pub initial_price: f64,
    pub final_price: f64,
    pub price_change_pct: f64,
}
