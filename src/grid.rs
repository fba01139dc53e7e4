//! Grid level generation and per-level side classification
//!
//! Level prices are fixed once at initialization; only the side tag mutates
//! as the reference price moves. Classification is kept separate from trade
//! execution so a level's state can never change mid-trade.

use serde::{Deserialize, Serialize};

use crate::types::ValidationError;

/// Relative tolerance for "level equals reference price" comparisons
const PRICE_REL_EPSILON: f64 = 1e-9;

/// Grid spacing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridMode {
    /// Constant absolute spacing between levels
    Arithmetic,
    /// Constant ratio between levels
    Geometric,
}

impl std::str::FromStr for GridMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "arithmetic" => Ok(GridMode::Arithmetic),
            "geometric" => Ok(GridMode::Geometric),
            other => Err(format!(
                "unknown grid mode '{other}' (expected 'arithmetic' or 'geometric')"
            )),
        }
    }
}

impl std::fmt::Display for GridMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridMode::Arithmetic => write!(f, "arithmetic"),
            GridMode::Geometric => write!(f, "geometric"),
        }
    }
}

/// Tradability of one grid level at the current instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridSide {
    /// Fires when the price path falls through the level
    Buy,
    /// Fires when the price path rises through the level
    Sell,
    /// Excluded from triggering until the next reclassification
    Blocked,
}

/// One rung of the grid ladder
///
/// `price` and `trade_amount` are fixed at initialization; `side` is
/// recomputed before every candle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridLevel {
    pub price: f64,
    pub side: GridSide,
    /// Fixed coin quantity traded whenever this level fires
    pub trade_amount: f64,
}

/// Generate `num_grids + 1` ordered level prices including both bounds.
///
/// Arithmetic mode spaces levels by a constant absolute step; geometric mode
/// by a constant ratio `(upper/lower)^(1/num_grids)`.
pub fn generate_grid_lines(
    lower_price: f64,
    upper_price: f64,
    num_grids: usize,
    mode: GridMode,
) -> Result<Vec<f64>, ValidationError> {
    if lower_price <= 0.0 || upper_price <= 0.0 {
        return Err(ValidationError::NonPositiveBounds {
            lower: lower_price,
            upper: upper_price,
        });
    }
    if lower_price >= upper_price {
        return Err(ValidationError::InvertedBounds {
            lower: lower_price,
            upper: upper_price,
        });
    }
    if num_grids < 2 {
        return Err(ValidationError::TooFewGrids(num_grids));
    }

    let n = num_grids as f64;
    let lines = match mode {
        GridMode::Arithmetic => {
            let step = (upper_price - lower_price) / n;
            (0..=num_grids)
                .map(|i| {
                    if i == num_grids {
                        upper_price
                    } else {
                        lower_price + step * i as f64
                    }
                })
                .collect()
        }
        GridMode::Geometric => {
            let ratio = (upper_price / lower_price).powf(1.0 / n);
            (0..=num_grids)
                .map(|i| {
                    if i == num_grids {
                        upper_price
                    } else {
                        lower_price * ratio.powi(i as i32)
                    }
                })
                .collect()
        }
    };

    Ok(lines)
}

/// Classify one level price against the reference price.
///
/// A level exactly at the reference is untradeable at that instant.
pub fn classify(level_price: f64, reference_price: f64) -> GridSide {
    if approx_eq(level_price, reference_price) {
        GridSide::Blocked
    } else if level_price > reference_price {
        GridSide::Sell
    } else {
        GridSide::Buy
    }
}

/// Recompute every level's side from the reference price (the previous
/// close). The level that most recently executed a trade stays `Blocked`
/// until a different level trades.
pub fn reclassify_sides(
    levels: &mut [GridLevel],
    reference_price: f64,
    last_traded: Option<usize>,
) {
    for (idx, level) in levels.iter_mut().enumerate() {
        level.side = if Some(idx) == last_traded {
            GridSide::Blocked
        } else {
            classify(level.price, reference_price)
        };
    }
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= PRICE_REL_EPSILON * a.abs().max(b.abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn arithmetic_lines_have_constant_step() {
        let lines = generate_grid_lines(50_000.0, 70_000.0, 20, GridMode::Arithmetic).unwrap();
        assert_eq!(lines.len(), 21);
        assert_eq!(lines[0], 50_000.0);
        assert_eq!(lines[20], 70_000.0);

        let step = lines[1] - lines[0];
        for pair in lines.windows(2) {
            assert_relative_eq!(pair[1] - pair[0], step, max_relative = 1e-10);
        }
    }

    #[test]
    fn geometric_lines_have_constant_ratio() {
        let lines = generate_grid_lines(100.0, 400.0, 4, GridMode::Geometric).unwrap();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], 100.0);
        assert_eq!(lines[4], 400.0);

        let ratio = lines[1] / lines[0];
        for pair in lines.windows(2) {
            assert_relative_eq!(pair[1] / pair[0], ratio, max_relative = 1e-10);
        }
    }

    #[test]
    fn lines_are_strictly_ascending() {
        for mode in [GridMode::Arithmetic, GridMode::Geometric] {
            let lines = generate_grid_lines(50.0, 150.0, 7, mode).unwrap();
            assert!(lines.windows(2).all(|w| w[0] < w[1]), "{mode} not ascending");
        }
    }

    #[test]
    fn inverted_bounds_rejected() {
        let err = generate_grid_lines(70_000.0, 50_000.0, 20, GridMode::Arithmetic);
        assert!(matches!(err, Err(ValidationError::InvertedBounds { .. })));
    }

    #[test]
    fn equal_bounds_rejected() {
        let err = generate_grid_lines(100.0, 100.0, 5, GridMode::Geometric);
        assert!(matches!(err, Err(ValidationError::InvertedBounds { .. })));
    }

    #[test]
    fn too_few_grids_rejected() {
        let err = generate_grid_lines(100.0, 200.0, 1, GridMode::Arithmetic);
        assert!(matches!(err, Err(ValidationError::TooFewGrids(1))));
    }

    #[test]
    fn non_positive_bounds_rejected() {
        let err = generate_grid_lines(0.0, 200.0, 5, GridMode::Geometric);
        assert!(matches!(err, Err(ValidationError::NonPositiveBounds { .. })));
    }

    #[test]
    fn classify_splits_around_reference() {
        assert_eq!(classify(110.0, 100.0), GridSide::Sell);
        assert_eq!(classify(90.0, 100.0), GridSide::Buy);
        assert_eq!(classify(100.0, 100.0), GridSide::Blocked);
    }

    fn make_levels(prices: &[f64]) -> Vec<GridLevel> {
        prices
            .iter()
            .map(|&price| GridLevel {
                price,
                side: GridSide::Blocked,
                trade_amount: 1.0,
            })
            .collect()
    }

    #[test]
    fn reclassify_respects_last_traded() {
        let mut levels = make_levels(&[90.0, 100.0, 110.0, 120.0]);
        reclassify_sides(&mut levels, 105.0, Some(2));

        assert_eq!(levels[0].side, GridSide::Buy);
        assert_eq!(levels[1].side, GridSide::Buy);
        assert_eq!(levels[2].side, GridSide::Blocked);
        assert_eq!(levels[3].side, GridSide::Sell);
    }

    #[test]
    fn reclassify_unblocks_previous_last_traded() {
        let mut levels = make_levels(&[90.0, 110.0]);
        reclassify_sides(&mut levels, 100.0, Some(0));
        assert_eq!(levels[0].side, GridSide::Blocked);

        // A later trade at another level releases the block
        reclassify_sides(&mut levels, 100.0, Some(1));
        assert_eq!(levels[0].side, GridSide::Buy);
        assert_eq!(levels[1].side, GridSide::Blocked);
    }
}
