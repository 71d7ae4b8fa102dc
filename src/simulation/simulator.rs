//! Per-trade grid simulation state machine.
//!
//! One simulated trade opens at the starting bar's open price and walks
//! forward bar by bar: recompute floating equity and the drawdown trace,
//! check ruin, check take-profit, then place whatever grid additions the
//! bar's range has crossed. The per-bar transition is a free function
//! over an explicit accumulator so each piece can be exercised without
//! driving a whole series.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::bars::Bar;
use crate::plan::MultiplierSchedule;
use crate::rollover::count_rollovers;
use crate::sessions::{session_label, Session};

use super::params::SimulationParameters;
use super::position::{GridPosition, Side};

/// Non-terminal simulator states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeState {
    /// Still placing grid additions as price moves adversely.
    Accumulating,
    /// Hard cap reached; only TP/ruin checks continue.
    Monitoring,
}

/// Terminal outcome of one simulated trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    TakeProfit,
    Ruin,
    EndOfData,
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseReason::TakeProfit => write!(f, "TP"),
            CloseReason::Ruin => write!(f, "RUIN"),
            CloseReason::EndOfData => write!(f, "END_OF_DATA"),
        }
    }
}

/// Running drawdown trace: equity peak, worst equity-minus-peak, and the
/// first bar offset at which each configured threshold was crossed.
#[derive(Debug, Clone)]
pub struct DrawdownTrace {
    peak: f64,
    max_dd: f64,
    first_cross: Vec<Option<u32>>,
}

impl DrawdownTrace {
    fn new(threshold_count: usize) -> Self {
        Self {
            peak: 0.0,
            max_dd: 0.0,
            first_cross: vec![None; threshold_count],
        }
    }

    /// Feed one bar's equity. Crossings are recorded once; the trace
    /// only ever worsens or holds.
    fn observe(&mut self, equity: f64, bar_offset: u32, thresholds: &[f64]) {
        self.peak = self.peak.max(equity);
        self.max_dd = self.max_dd.min(equity - self.peak);
        let dd_usd = -self.max_dd;
        for (slot, threshold) in self.first_cross.iter_mut().zip(thresholds) {
            if slot.is_none() && dd_usd >= *threshold {
                *slot = Some(bar_offset);
            }
        }
    }

    /// Worst drawdown so far, always <= 0.
    pub fn peak_drawdown(&self) -> f64 {
        self.max_dd
    }
}

/// One finished simulated trade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub side: Side,
    /// True when the trade breached the stop loss.
    pub broke: bool,
    pub outcome: CloseReason,
    /// Worst drawdown in USD, always <= 0.
    pub dd_peak: f64,
    /// Entries placed, including the initial one.
    pub entries_used: u32,
    pub duration_bars: u32,
    pub start_ts: NaiveDateTime,
    pub end_ts: NaiveDateTime,
    /// None when sessions are not meaningful for the instrument.
    pub start_session: Option<Session>,
    pub end_session: Option<Session>,
    /// Accrued overnight swap in USD.
    pub swap_usd: f64,
    /// Realized exit P&L: final equity plus swap.
    pub exit_pnl_usd: f64,
    /// Bar offset of the first crossing per configured drawdown
    /// threshold, parallel to `SimulationParameters::dd_thresholds`.
    pub dd_first_cross: Vec<Option<u32>>,
}

/// Per-trade accumulator threaded through [`step_bar`].
#[derive(Debug, Clone)]
pub struct TradeAccumulator {
    position: GridPosition,
    schedule: MultiplierSchedule,
    trace: DrawdownTrace,
    state: TradeState,
    hard_cap: u32,
    additions: u32,
}

impl TradeAccumulator {
    /// Open the initial entry at `entry_price`.
    pub fn open(side: Side, entry_price: f64, params: &SimulationParameters) -> Self {
        let hard_cap = params.scaling.max_additions();
        Self {
            position: GridPosition::open(side, entry_price, params.lot0),
            schedule: params.scaling.schedule(),
            trace: DrawdownTrace::new(params.dd_thresholds.len()),
            state: if hard_cap == 0 {
                TradeState::Monitoring
            } else {
                TradeState::Accumulating
            },
            hard_cap,
            additions: 0,
        }
    }

    pub fn state(&self) -> TradeState {
        self.state
    }

    pub fn position(&self) -> &GridPosition {
        &self.position
    }

    pub fn trace(&self) -> &DrawdownTrace {
        &self.trace
    }
}

/// Advance the accumulator by one bar. Returns the terminal reason if
/// the trade closes on this bar.
///
/// Check order is part of the contract: drawdown update, then ruin, then
/// take-profit, then grid additions. A bar that triggers a terminal
/// state never also adds levels.
pub fn step_bar(
    acc: &mut TradeAccumulator,
    bar: &Bar,
    bar_offset: u32,
    params: &SimulationParameters,
) -> Option<CloseReason> {
    let equity = acc.position.equity(bar.close, params.contract_size);
    acc.trace.observe(equity, bar_offset, &params.dd_thresholds);

    if acc.trace.peak_drawdown() <= params.stop_loss {
        return Some(CloseReason::Ruin);
    }
    if acc.position.take_profit_hit(bar.close, params.tp_offset) {
        return Some(CloseReason::TakeProfit);
    }

    if acc.state == TradeState::Accumulating {
        let crossed = acc.position.levels_crossed(bar.low, bar.high, params.distance);
        let room = acc.hard_cap - acc.additions;
        for _ in 0..crossed.min(room) {
            let multiplier = acc.schedule.next_multiplier();
            acc.position.add_level(params.distance, multiplier);
            acc.additions += 1;
        }
        if acc.additions >= acc.hard_cap {
            acc.state = TradeState::Monitoring;
        }
    }
    None
}

/// Simulate one grid trade from `start_idx` to a terminal state.
///
/// Every call reaches exactly one terminal state: series exhaustion
/// finalizes as [`CloseReason::EndOfData`] with `broke = false`, using
/// the last available bar for equity and swap accrual.
pub fn simulate_trade(
    bars: &[Bar],
    start_idx: usize,
    side: Side,
    params: &SimulationParameters,
) -> SimulationResult {
    let open_bar = &bars[start_idx];
    let start_ts = open_bar.timestamp;
    let start_session = params.sessions_enabled.then(|| session_label(start_ts));

    let mut acc = TradeAccumulator::open(side, open_bar.open, params);
    let mut idx = start_idx;
    let mut outcome = CloseReason::EndOfData;

    while idx + 1 < bars.len() {
        idx += 1;
        let offset = (idx - start_idx) as u32;
        if let Some(reason) = step_bar(&mut acc, &bars[idx], offset, params) {
            outcome = reason;
            break;
        }
    }

    let end_bar = &bars[idx];
    let end_ts = end_bar.timestamp;
    let nights = count_rollovers(start_ts, end_ts, params.rollover_hour);
    let swap_rate = side.swap_rate(params.swap_long, params.swap_short);
    let swap_usd = f64::from(nights) * acc.position.total_lots() * swap_rate;
    let exit_pnl_usd = acc.position.equity(end_bar.close, params.contract_size) + swap_usd;

    SimulationResult {
        side,
        broke: outcome == CloseReason::Ruin,
        outcome,
        dd_peak: acc.trace.peak_drawdown(),
        entries_used: acc.position.entries_used(),
        duration_bars: (idx - start_idx) as u32,
        start_ts,
        end_ts,
        start_session,
        end_session: params.sessions_enabled.then(|| session_label(end_ts)),
        swap_usd,
        exit_pnl_usd,
        dd_first_cross: acc.trace.first_cross,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{LotScaling, PlanSegment};
    use chrono::NaiveDate;

    fn params() -> SimulationParameters {
        SimulationParameters {
            distance: 1.0,
            lot0: 0.01,
            scaling: LotScaling::Uniform {
                multiplier: 2.0,
                max_steps: 5,
            },
            tp_offset: 0.5,
            stop_loss: -1000.0,
            contract_size: 100.0,
            swap_long: -4.0,
            swap_short: 1.0,
            rollover_hour: 16,
            sessions_enabled: false,
            dd_thresholds: vec![5.0, 100.0],
        }
    }

    fn bar(minute: u32, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(10, minute, 0)
                .unwrap(),
            open,
            high,
            low,
            close,
        }
    }

    /// 10-bar monotonic fall from 100 to 90 in 1.0 steps.
    fn falling_bars() -> Vec<Bar> {
        (0..10)
            .map(|i| {
                let price = 100.0 - i as f64;
                bar(i as u32, price, price, price, price)
            })
            .collect()
    }

    #[test]
    fn test_falling_path_caps_at_four_additions() {
        let bars = falling_bars();
        let p = params();
        let mut acc = TradeAccumulator::open(Side::Buy, bars[0].open, &p);

        for (offset, b) in bars.iter().enumerate().skip(1).take(4) {
            assert_eq!(step_bar(&mut acc, b, offset as u32, &p), None);
        }
        // Hard cap of 4 additions reached after bar 4; the state machine
        // must be monitoring before bar 5 is processed.
        assert_eq!(acc.state(), TradeState::Monitoring);
        assert_eq!(acc.position().entries_used(), 5);
        assert_eq!(
            acc.position().entry_prices(),
            &[100.0, 99.0, 98.0, 97.0, 96.0]
        );

        let result = simulate_trade(&bars, 0, Side::Buy, &p);
        assert_eq!(result.outcome, CloseReason::EndOfData);
        assert!(!result.broke);
        assert_eq!(result.entries_used, 5);
        assert_eq!(result.duration_bars, 9);
    }

    #[test]
    fn test_wide_bar_adds_multiple_levels() {
        let bars = vec![
            bar(0, 100.0, 100.0, 100.0, 100.0),
            bar(1, 100.0, 100.0, 96.5, 97.0),
        ];
        let p = params();
        let result = simulate_trade(&bars, 0, Side::Buy, &p);
        // Low of 96.5 crosses 99, 98, 97 in a single bar.
        assert_eq!(result.entries_used, 4);
    }

    #[test]
    fn test_take_profit_on_favorable_close() {
        let bars = vec![
            bar(0, 100.0, 100.0, 100.0, 100.0),
            bar(1, 100.2, 100.6, 100.1, 100.5),
            bar(2, 100.5, 101.0, 100.4, 101.0),
        ];
        let p = params();
        let result = simulate_trade(&bars, 0, Side::Buy, &p);
        assert_eq!(result.outcome, CloseReason::TakeProfit);
        assert!(!result.broke);
        assert_eq!(result.entries_used, 1);
        assert_eq!(result.duration_bars, 1);
        // Close 100.5 >= PMP 100.0 + 0.5.
        assert!(result.exit_pnl_usd > 0.0);
    }

    #[test]
    fn test_ruin_when_drawdown_breaches_stop() {
        let mut p = params();
        p.stop_loss = -150.0;
        // Single entry, no additions possible, price collapses.
        p.scaling = LotScaling::Uniform {
            multiplier: 2.0,
            max_steps: 1,
        };
        p.lot0 = 1.0;
        let bars = vec![
            bar(0, 100.0, 100.0, 100.0, 100.0),
            bar(1, 99.5, 99.5, 99.0, 99.0),
            bar(2, 98.0, 98.0, 97.0, 97.5),
        ];
        let result = simulate_trade(&bars, 0, Side::Buy, &p);
        // Equity at bar 2 close: 1.0 * (97.5 - 100) * 100 = -250.
        assert_eq!(result.outcome, CloseReason::Ruin);
        assert!(result.broke);
        assert!(result.dd_peak <= p.stop_loss);
        assert_eq!(result.duration_bars, 2);
    }

    #[test]
    fn test_dd_peak_never_positive_and_thresholds_monotonic() {
        let bars = falling_bars();
        let p = params();
        let result = simulate_trade(&bars, 0, Side::Buy, &p);
        assert!(result.dd_peak <= 0.0);
        // First threshold (5 USD) crossed no later than the second (100).
        let first = result.dd_first_cross[0];
        let second = result.dd_first_cross[1];
        assert!(first.is_some());
        if let (Some(a), Some(b)) = (first, second) {
            assert!(a <= b);
        }
    }

    #[test]
    fn test_staged_plan_scales_by_segment() {
        let mut p = params();
        p.scaling = LotScaling::Staged(vec![
            PlanSegment {
                count: 2,
                multiplier: 2.0,
            },
            PlanSegment {
                count: 2,
                multiplier: 1.5,
            },
        ]);
        let bars = falling_bars();
        let mut acc = TradeAccumulator::open(Side::Buy, bars[0].open, &p);
        for (offset, b) in bars.iter().enumerate().skip(1).take(5) {
            step_bar(&mut acc, b, offset as u32, &p);
        }
        assert_eq!(acc.position().entries_used(), 5);
        // 0.01 -> 0.02 -> 0.04 -> 0.06 -> 0.09
        let expected = 0.01 + 0.02 + 0.04 + 0.06 + 0.09;
        assert!((acc.position().total_lots() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_sell_side_mirrors_buy() {
        let bars: Vec<Bar> = (0..6)
            .map(|i| {
                let price = 100.0 + i as f64;
                bar(i as u32, price, price, price, price)
            })
            .collect();
        let p = params();
        let result = simulate_trade(&bars, 0, Side::Sell, &p);
        assert_eq!(result.entries_used, 5);
        assert_eq!(result.outcome, CloseReason::EndOfData);
        // Adverse rise for a SELL: drawdown must be negative.
        assert!(result.dd_peak < 0.0);
    }

    #[test]
    fn test_degenerate_flat_market_single_entry() {
        let bars: Vec<Bar> = (0..5).map(|i| bar(i, 100.0, 100.0, 100.0, 100.0)).collect();
        let p = params();
        let result = simulate_trade(&bars, 0, Side::Buy, &p);
        assert_eq!(result.outcome, CloseReason::EndOfData);
        assert_eq!(result.entries_used, 1);
        assert_eq!(result.dd_peak, 0.0);
    }

    #[test]
    fn test_start_on_last_bar_closes_immediately() {
        let bars = falling_bars();
        let p = params();
        let result = simulate_trade(&bars, bars.len() - 1, Side::Buy, &p);
        assert_eq!(result.outcome, CloseReason::EndOfData);
        assert_eq!(result.duration_bars, 0);
        assert_eq!(result.entries_used, 1);
    }

    #[test]
    fn test_swap_accrues_per_rollover_night() {
        let day_bar = |d: u32, price: f64| Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, d)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            open: price,
            high: price,
            low: price,
            close: price,
        };
        let bars = vec![day_bar(1, 100.0), day_bar(2, 100.0), day_bar(3, 100.0)];
        let mut p = params();
        p.scaling = LotScaling::Uniform {
            multiplier: 2.0,
            max_steps: 1,
        };
        p.lot0 = 2.0;
        let result = simulate_trade(&bars, 0, Side::Buy, &p);
        // Two 16:00 crossings at -4 USD per lot per night, 2 lots.
        assert!((result.swap_usd - (2.0 * 2.0 * -4.0)).abs() < 1e-9);
        assert!((result.exit_pnl_usd - result.swap_usd).abs() < 1e-9);
    }
}
