//! Configuration management
//!
//! Handles loading and parsing of JSON configuration files and validation
//! of strategy parameters before a run starts.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::grid::GridMode;
use crate::types::ValidationError;

/// Default number of interpolated points per candle
pub const DEFAULT_PATH_SAMPLES: usize = 20;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub grid: GridParams,
    #[serde(default)]
    pub data: DataConfig,
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;
        Ok(config)
    }
}

/// Strategy parameters for one simulation run
///
/// All parameters are passed explicitly into the engine; nothing is carried
/// in ambient process state between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridParams {
    /// Starting capital in quote currency
    pub total_investment: f64,
    pub lower_price: f64,
    pub upper_price: f64,
    /// Number of grid intervals; the ladder has `num_grids + 1` levels
    pub num_grids: usize,
    pub grid_mode: GridMode,
    /// Per-trade fee as a fraction, e.g. 0.001 for 0.1%
    pub fee_rate: f64,
    /// Interpolated points per candle for intrabar crossing detection.
    /// Linear close-to-close sampling is an approximation that tends to
    /// undercount grid round trips; raise this for finer detection.
    #[serde(default = "default_path_samples")]
    pub path_samples: usize,
}

fn default_path_samples() -> usize {
    DEFAULT_PATH_SAMPLES
}

impl Default for GridParams {
    fn default() -> Self {
        GridParams {
            total_investment: 10_000.0,
            lower_price: 50_000.0,
            upper_price: 70_000.0,
            num_grids: 20,
            grid_mode: GridMode::Arithmetic,
            fee_rate: 0.001,
            path_samples: DEFAULT_PATH_SAMPLES,
        }
    }
}

impl GridParams {
    /// Check every parameter domain; called once before any simulation step
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.total_investment <= 0.0 {
            return Err(ValidationError::NonPositiveInvestment(
                self.total_investment,
            ));
        }
        if self.lower_price <= 0.0 || self.upper_price <= 0.0 {
            return Err(ValidationError::NonPositiveBounds {
                lower: self.lower_price,
                upper: self.upper_price,
            });
        }
        if self.lower_price >= self.upper_price {
            return Err(ValidationError::InvertedBounds {
                lower: self.lower_price,
                upper: self.upper_price,
            });
        }
        if self.num_grids < 2 {
            return Err(ValidationError::TooFewGrids(self.num_grids));
        }
        if !(0.0..0.1).contains(&self.fee_rate) {
            return Err(ValidationError::FeeRateOutOfRange(self.fee_rate));
        }
        if self.path_samples < 2 {
            return Err(ValidationError::TooFewPathSamples(self.path_samples));
        }
        Ok(())
    }
}

/// Candle data source configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to a CSV file with `timestamp,open,high,low,close,volume` rows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_validate() {
        assert!(GridParams::default().validate().is_ok());
    }

    #[test]
    fn inverted_bounds_rejected() {
        let params = GridParams {
            lower_price: 70_000.0,
            upper_price: 50_000.0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ValidationError::InvertedBounds { .. })
        ));
    }

    #[test]
    fn fee_rate_domain_enforced() {
        for fee_rate in [-0.001, 0.1, 0.5] {
            let params = GridParams {
                fee_rate,
                ..Default::default()
            };
            assert!(
                matches!(
                    params.validate(),
                    Err(ValidationError::FeeRateOutOfRange(_))
                ),
                "fee_rate {fee_rate} should be rejected"
            );
        }

        let zero_fee = GridParams {
            fee_rate: 0.0,
            ..Default::default()
        };
        assert!(zero_fee.validate().is_ok());
    }

    #[test]
    fn config_json_round_trip() {
        let config = Config {
            grid: GridParams::default(),
            data: DataConfig {
                csv_path: Some("data/BTCUSDT_1h.csv".to_string()),
            },
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.grid.num_grids, config.grid.num_grids);
        assert_eq!(parsed.grid.grid_mode, config.grid.grid_mode);
        assert_eq!(parsed.data.csv_path, config.data.csv_path);
    }

    #[test]
    fn path_samples_defaults_when_absent() {
        let json = r#"{
            "grid": {
                "total_investment": 1000.0,
                "lower_price": 90.0,
                "upper_price": 110.0,
                "num_grids": 10,
                "grid_mode": "geometric",
                "fee_rate": 0.001
            }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.grid.path_samples, DEFAULT_PATH_SAMPLES);
    }
}
