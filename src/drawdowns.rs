//! Non-overlapping drawdown event detection over High/Low extremes.
//!
//! A drawdown starts at a running high, deepens at subsequent lows, and
//! closes when a new High exceeds the prior peak by the hysteresis
//! margin `min_new_high`. Peaks and troughs use the bar extremes, not
//! closes, so intrabar excursions count.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::bars::Bar;

const EPS: f64 = 1e-12;

/// One completed (or still-open) drawdown episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawdownEvent {
    pub peak_ts: NaiveDateTime,
    pub peak_high: f64,
    pub trough_ts: NaiveDateTime,
    pub trough_low: f64,
    /// Bar at which a new hysteresis-clearing high closed the episode;
    /// `None` when the series ended still underwater.
    pub recovery_ts: Option<NaiveDateTime>,
    /// Relative depth `trough_low / peak_high - 1`, always <= 0.
    pub depth: f64,
}

/// Detect non-overlapping drawdown events.
///
/// `min_new_high` is the relative hysteresis a High must clear above the
/// prior peak to close an episode (0.0 means any new high). Episodes
/// shallower than `min_dd` are discarded. Events are returned worst
/// first.
pub fn drawdown_events(bars: &[Bar], min_new_high: f64, min_dd: f64) -> Vec<DrawdownEvent> {
    let Some(first) = bars.first() else {
        return Vec::new();
    };

    let mut events = Vec::new();
    let mut peak_high = first.high;
    let mut peak_ts = first.timestamp;
    let mut trough_low = first.low;
    let mut trough_ts = first.timestamp;
    let mut in_dd = false;

    let mut close_episode = |peak_ts: NaiveDateTime,
                             peak_high: f64,
                             trough_ts: NaiveDateTime,
                             trough_low: f64,
                             recovery_ts: Option<NaiveDateTime>| {
        let depth = trough_low / peak_high - 1.0;
        if depth <= -min_dd {
            events.push(DrawdownEvent {
                peak_ts,
                peak_high,
                trough_ts,
                trough_low,
                recovery_ts,
                depth,
            });
        }
    };

    for bar in &bars[1..] {
        let threshold = peak_high * (1.0 + min_new_high);
        if bar.high > threshold + EPS {
            if in_dd {
                close_episode(peak_ts, peak_high, trough_ts, trough_low, Some(bar.timestamp));
                in_dd = false;
            }
            peak_high = bar.high;
            peak_ts = bar.timestamp;
            trough_low = bar.low;
            trough_ts = bar.timestamp;
        } else if !in_dd {
            in_dd = true;
            trough_low = bar.low;
            trough_ts = bar.timestamp;
        } else if bar.low < trough_low {
            trough_low = bar.low;
            trough_ts = bar.timestamp;
        }
    }

    if in_dd {
        close_episode(peak_ts, peak_high, trough_ts, trough_low, None);
    }

    events.sort_by(|a, b| a.depth.total_cmp(&b.depth));
    events
}
