//! Descriptive statistics over a Monte Carlo result set.
//!
//! Downstream consumers get the full result table; this module only
//! condenses it into the figures the CLI report prints.

use serde::Serialize;
use std::collections::BTreeMap;

use super::position::Side;
use super::simulator::{CloseReason, SimulationResult};

/// Ruin counts for one slice of the result set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SliceBreakdown {
    pub trades: usize,
    pub ruined: usize,
    pub ruin_rate: f64,
}

impl SliceBreakdown {
    fn add(&mut self, broke: bool) {
        self.trades += 1;
        if broke {
            self.ruined += 1;
        }
    }

    fn finish(&mut self) {
        if self.trades > 0 {
            self.ruin_rate = self.ruined as f64 / self.trades as f64;
        }
    }
}

/// Per-session ruin counts, keyed by the trade's start session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionBreakdown {
    pub session: String,
    #[serde(flatten)]
    pub counts: SliceBreakdown,
}

/// Summary of one Monte Carlo batch.
#[derive(Debug, Clone, Serialize)]
pub struct RuinSummary {
    pub trades: usize,
    pub ruined: usize,
    pub ruin_rate: f64,
    pub take_profit: usize,
    pub end_of_data: usize,
    /// Worst single-trade drawdown in USD (<= 0).
    pub dd_worst: f64,
    pub dd_mean: f64,
    /// 95th-percentile worst drawdown (5th percentile of the signed
    /// drawdown distribution).
    pub dd_p95: f64,
    pub avg_entries: f64,
    pub max_entries: u32,
    pub avg_duration_bars: f64,
    pub avg_swap_usd: f64,
    pub avg_exit_pnl_usd: f64,
    pub buy: SliceBreakdown,
    pub sell: SliceBreakdown,
    pub sessions: Vec<SessionBreakdown>,
}

/// Condense a result set into the batch summary. An empty set yields
/// all-zero figures.
pub fn summarize(results: &[SimulationResult]) -> RuinSummary {
    let mut buy = SliceBreakdown::default();
    let mut sell = SliceBreakdown::default();
    let mut sessions: BTreeMap<String, SliceBreakdown> = BTreeMap::new();

    let mut ruined = 0usize;
    let mut take_profit = 0usize;
    let mut end_of_data = 0usize;
    let mut dd_sum = 0.0;
    let mut entries_sum = 0u64;
    let mut max_entries = 0u32;
    let mut duration_sum = 0u64;
    let mut swap_sum = 0.0;
    let mut pnl_sum = 0.0;

    for result in results {
        match result.outcome {
            CloseReason::Ruin => ruined += 1,
            CloseReason::TakeProfit => take_profit += 1,
            CloseReason::EndOfData => end_of_data += 1,
        }
        match result.side {
            Side::Buy => buy.add(result.broke),
            Side::Sell => sell.add(result.broke),
        }
        if let Some(session) = result.start_session {
            sessions
                .entry(session.to_string())
                .or_default()
                .add(result.broke);
        }
        dd_sum += result.dd_peak;
        entries_sum += u64::from(result.entries_used);
        max_entries = max_entries.max(result.entries_used);
        duration_sum += u64::from(result.duration_bars);
        swap_sum += result.swap_usd;
        pnl_sum += result.exit_pnl_usd;
    }

    let count = results.len();
    let denom = count.max(1) as f64;

    let mut dd_sorted: Vec<f64> = results.iter().map(|r| r.dd_peak).collect();
    dd_sorted.sort_by(|a, b| a.total_cmp(b));
    let dd_worst = dd_sorted.first().copied().unwrap_or(0.0);
    let dd_p95 = if dd_sorted.is_empty() {
        0.0
    } else {
        dd_sorted[(dd_sorted.len() as f64 * 0.05) as usize]
    };

    buy.finish();
    sell.finish();
    let sessions = sessions
        .into_iter()
        .map(|(session, mut counts)| {
            counts.finish();
            SessionBreakdown { session, counts }
        })
        .collect();

    RuinSummary {
        trades: count,
        ruined,
        ruin_rate: ruined as f64 / denom,
        take_profit,
        end_of_data,
        dd_worst,
        dd_mean: dd_sum / denom,
        dd_p95,
        avg_entries: entries_sum as f64 / denom,
        max_entries,
        avg_duration_bars: duration_sum as f64 / denom,
        avg_swap_usd: swap_sum / denom,
        avg_exit_pnl_usd: pnl_sum / denom,
        buy,
        sell,
        sessions,
    }
}
