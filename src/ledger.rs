//! FIFO inventory ledger
//!
//! Ordered queue of open purchase lots. Buys append at the tail; sells
//! consume oldest-first, splitting the head lot when it is larger than the
//! requested amount. Consumption is all-or-nothing: if the total open
//! inventory cannot cover the request, the ledger is left untouched.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::AMOUNT_EPSILON;

/// One open purchase lot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    pub amount: f64,
    pub acquisition_price: f64,
    pub timestamp: DateTime<Utc>,
}

/// FIFO queue of open lots
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FifoLedger {
    lots: VecDeque<Lot>,
}

impl FifoLedger {
    pub fn new() -> Self {
        FifoLedger {
            lots: VecDeque::new(),
        }
    }

    /// Add a lot at the tail
    pub fn append(&mut self, amount: f64, price: f64, timestamp: DateTime<Utc>) {
        self.lots.push_back(Lot {
            amount,
            acquisition_price: price,
            timestamp,
        });
    }

    /// Remove `amount` starting from the oldest lot and return the gross
    /// FIFO profit `sum((sell_price - lot_price) * slice)` across the
    /// consumed slices.
    ///
    /// Returns `None` without mutating anything when the open inventory
    /// cannot cover the full amount; the caller treats that as "trade not
    /// possible".
    pub fn consume(&mut self, amount: f64, sell_price: f64) -> Option<f64> {
        if self.total_amount() + AMOUNT_EPSILON < amount {
            return None;
        }

        let mut remaining = amount;
        let mut profit = 0.0;

        while remaining > AMOUNT_EPSILON {
            let Some(oldest) = self.lots.front_mut() else {
                break;
            };
            let slice = oldest.amount.min(remaining);
            profit += (sell_price - oldest.acquisition_price) * slice;
            oldest.amount -= slice;
            remaining -= slice;

            if oldest.amount <= AMOUNT_EPSILON {
                self.lots.pop_front();
            }
        }

        Some(profit)
    }

    /// Sum of all open lot amounts
    pub fn total_amount(&self) -> f64 {
        self.lots.iter().map(|lot| lot.amount).sum()
    }

    /// Number of open lots
    pub fn depth(&self) -> usize {
        self.lots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    pub fn lots(&self) -> impl Iterator<Item = &Lot> {
        self.lots.iter()
    }
}
