//! Data loading and synthetic series generation
//!
//! Handles loading OHLCV data from CSV files and generating deterministic
//! price patterns for exercising the engine without market data.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use std::path::Path;
use tracing::info;

use crate::types::Candle;

// =============================================================================
// CSV Data Loading
// =============================================================================

/// Load OHLCV data from a CSV file with
/// `timestamp,open,high,low,close,volume` rows.
///
/// Rows are sorted ascending by timestamp after parsing; the engine depends
/// on that ordering.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Candle>> {
    let mut reader = csv::Reader::from_path(path.as_ref()).context("Failed to open CSV file")?;

    let mut candles = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.context(format!("Failed to read row {}", row_idx + 1))?;

        let ts_str = record.get(0).context("Missing timestamp column")?;
        let timestamp = ts_str
            .parse::<DateTime<Utc>>()
            .or_else(|_| {
                // Try parsing without timezone and assume UTC
                chrono::NaiveDateTime::parse_from_str(ts_str, "%Y-%m-%d %H:%M:%S")
                    .map(|ndt| DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
            })
            .context(format!("Failed to parse timestamp: {}", ts_str))?;

        let open: f64 = record
            .get(1)
            .context("Missing open column")?
            .parse()
            .context("Failed to parse open")?;
        let high: f64 = record
            .get(2)
            .context("Missing high column")?
            .parse()
            .context("Failed to parse high")?;
        let low: f64 = record
            .get(3)
            .context("Missing low column")?
            .parse()
            .context("Failed to parse low")?;
        let close: f64 = record
            .get(4)
            .context("Missing close column")?
            .parse()
            .context("Failed to parse close")?;
        let volume: f64 = record
            .get(5)
            .context("Missing volume column")?
            .parse()
            .context("Failed to parse volume")?;

        candles.push(Candle {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    candles.sort_by_key(|c| c.timestamp);
    info!(
        "Loaded {} candles from {}",
        candles.len(),
        path.as_ref().display()
    );

    Ok(candles)
}

// =============================================================================
// Synthetic Price Patterns
// =============================================================================

/// Deterministic price patterns for engine smoke runs.
///
/// The original dashboard also offered random-walk variants; those need an
/// RNG and are deliberately absent so every generated series replays
/// identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricePattern {
    LinearUp,
    LinearDown,
    Sine,
    RangeBound,
    Breakout,
}

impl std::str::FromStr for PricePattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "linear_up" => Ok(PricePattern::LinearUp),
            "linear_down" => Ok(PricePattern::LinearDown),
            "sine" => Ok(PricePattern::Sine),
            "range_bound" => Ok(PricePattern::RangeBound),
            "breakout" => Ok(PricePattern::Breakout),
            other => Err(format!(
                "unknown pattern '{other}' (expected linear_up, linear_down, sine, range_bound or breakout)"
            )),
        }
    }
}

impl std::fmt::Display for PricePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PricePattern::LinearUp => "linear_up",
            PricePattern::LinearDown => "linear_down",
            PricePattern::Sine => "sine",
            PricePattern::RangeBound => "range_bound",
            PricePattern::Breakout => "breakout",
        };
        write!(f, "{name}")
    }
}

/// Generate an hourly candle series following the given pattern.
///
/// `amplitude` scales the price excursion. Prices are floored at 1% of the
/// initial price so downtrends never cross zero.
pub fn generate_pattern(
    pattern: PricePattern,
    periods: usize,
    initial_price: f64,
    amplitude: f64,
    start: DateTime<Utc>,
) -> Vec<Candle> {
    let floor = initial_price * 0.01;
    let half = (periods / 2).max(1);

    (0..periods)
        .map(|i| {
            let t = i as f64;
            let price = match pattern {
                PricePattern::LinearUp => initial_price + t * amplitude / 10.0,
                PricePattern::LinearDown => initial_price - t * amplitude / 10.0,
                PricePattern::Sine => initial_price + amplitude * (t / 5.0).sin(),
                PricePattern::RangeBound => {
                    initial_price + amplitude * (0.5 - (i % 20) as f64 / 20.0)
                }
                PricePattern::Breakout => {
                    if i < half {
                        initial_price + amplitude * 0.2 * t / half as f64
                    } else {
                        initial_price
                            + amplitude * 0.2
                            + amplitude * 0.8 * (i - half) as f64 / (periods - half) as f64
                    }
                }
            }
            .max(floor);

            let spread = amplitude / 50.0;
            Candle {
                timestamp: start + Duration::hours(i as i64),
                open: price,
                high: price + spread,
                low: (price - spread).max(floor * 0.5),
                close: price,
                volume: 100.0,
            }
        })
        .collect()
}
