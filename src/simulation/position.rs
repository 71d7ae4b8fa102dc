//! Grid position bookkeeping for one simulated trade.

use serde::{Deserialize, Serialize};

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Pick the side-dependent overnight swap rate.
    pub fn swap_rate(self, swap_long: f64, swap_short: f64) -> f64 {
        match self {
            Side::Buy => swap_long,
            Side::Sell => swap_short,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Open grid position: ordered entries with lot sizes and the running
/// volume-weighted average entry price (PMP).
///
/// By construction BUY entries form a non-increasing price sequence and
/// SELL entries a non-decreasing one; levels step by a fixed distance
/// against the position.
#[derive(Debug, Clone)]
pub struct GridPosition {
    side: Side,
    entries: Vec<f64>,
    lots: Vec<f64>,
    total_lots: f64,
    pmp: f64,
    last_level: f64,
}

impl GridPosition {
    pub fn open(side: Side, entry_price: f64, lot0: f64) -> Self {
        Self {
            side,
            entries: vec![entry_price],
            lots: vec![lot0],
            total_lots: lot0,
            pmp: entry_price,
            last_level: entry_price,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Volume-weighted average entry price.
    pub fn pmp(&self) -> f64 {
        self.pmp
    }

    pub fn total_lots(&self) -> f64 {
        self.total_lots
    }

    /// Number of entries placed so far, including the initial one.
    pub fn entries_used(&self) -> u32 {
        self.entries.len() as u32
    }

    pub fn entry_prices(&self) -> &[f64] {
        &self.entries
    }

    pub fn last_level(&self) -> f64 {
        self.last_level
    }

    /// Floating equity in USD at `price`.
    pub fn equity(&self, price: f64, contract_size: f64) -> f64 {
        let per_lot: f64 = self
            .entries
            .iter()
            .zip(&self.lots)
            .map(|(entry, lots)| {
                lots * match self.side {
                    Side::Buy => price - entry,
                    Side::Sell => entry - price,
                }
            })
            .sum();
        per_lot * contract_size
    }

    /// How many grid levels the bar's adverse extreme has crossed beyond
    /// the last placed level. A wide bar can cross several at once.
    pub fn levels_crossed(&self, low: f64, high: f64, distance: f64) -> u32 {
        match self.side {
            Side::Buy if low <= self.last_level - distance => {
                ((self.last_level - low) / distance).floor() as u32
            }
            Side::Sell if high >= self.last_level + distance => {
                ((high - self.last_level) / distance).floor() as u32
            }
            _ => 0,
        }
    }

    /// Append the next averaging level one `distance` against the
    /// position and recompute the PMP.
    pub fn add_level(&mut self, distance: f64, multiplier: f64) {
        self.last_level = match self.side {
            Side::Buy => self.last_level - distance,
            Side::Sell => self.last_level + distance,
        };
        let lot = self.lots.last().copied().unwrap_or(0.0) * multiplier;
        self.entries.push(self.last_level);
        self.lots.push(lot);
        self.total_lots += lot;
        let weighted: f64 = self
            .entries
            .iter()
            .zip(&self.lots)
            .map(|(entry, lots)| entry * lots)
            .sum();
        self.pmp = weighted / self.total_lots;
    }

    /// Whether `price` has moved favorably by `tp_offset` beyond the PMP.
    pub fn take_profit_hit(&self, price: f64, tp_offset: f64) -> bool {
        match self.side {
            Side::Buy => price >= self.pmp + tp_offset,
            Side::Sell => price <= self.pmp - tp_offset,
        }
    }
}
