//! Inter-bar gap classification.
//!
//! Weekend and daily-break detection run before the generic fallback:
//! a Friday-to-Monday transition whose Friday hour also matches the
//! daily-break window must still report as a weekend gap.

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::bars::Bar;

/// Gap severity, least to worst. The derived `Ord` is the total
/// ordering used by "worst gap in a range" scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapKind {
    NoGap,
    Gap,
    DailyBreak,
    WeekendGap,
}

impl std::fmt::Display for GapKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GapKind::NoGap => write!(f, "no_gap"),
            GapKind::Gap => write!(f, "gap"),
            GapKind::DailyBreak => write!(f, "daily_break"),
            GapKind::WeekendGap => write!(f, "weekend_gap"),
        }
    }
}

/// Minimum gap thresholds in minutes.
#[derive(Debug, Clone, Copy)]
pub struct GapConfig {
    /// Delta below this is ordinary bar-to-bar continuity (default: 45).
    pub daily_min: i64,
    /// Minimum delta for weekend detection (default: 60).
    pub weekend_min: i64,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            daily_min: 45,
            weekend_min: 60,
        }
    }
}

/// Classify the gap between two consecutive bar timestamps.
pub fn classify_gap(prev: NaiveDateTime, curr: NaiveDateTime, config: &GapConfig) -> GapKind {
    let delta_min = (curr - prev).num_seconds() as f64 / 60.0;
    if delta_min < config.daily_min as f64 {
        return GapKind::NoGap;
    }
    if prev.weekday() == Weekday::Fri
        && matches!(curr.weekday(), Weekday::Sun | Weekday::Mon)
        && delta_min >= config.weekend_min as f64
    {
        return GapKind::WeekendGap;
    }
    // 15:00-18:00 local window reads as the exchange daily settlement pause.
    if (15..=18).contains(&prev.hour()) {
        return GapKind::DailyBreak;
    }
    GapKind::Gap
}

/// Worst gap found between consecutive bars of a range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapScan {
    pub kind: GapKind,
    pub minutes: f64,
    pub points: f64,
}

/// Scan `bars[from..=to]` for the worst gap: severity first, then the
/// absolute open-to-close price jump as tie-break.
pub fn worst_gap_in_range(bars: &[Bar], from: usize, to: usize, config: &GapConfig) -> GapScan {
    let mut worst = GapScan {
        kind: GapKind::NoGap,
        minutes: 0.0,
        points: 0.0,
    };
    if bars.is_empty() {
        return worst;
    }
    let end = to.min(bars.len() - 1);
    for i in (from + 1)..=end {
        let kind = classify_gap(bars[i - 1].timestamp, bars[i].timestamp, config);
        if kind == GapKind::NoGap {
            continue;
        }
        let minutes = (bars[i].timestamp - bars[i - 1].timestamp).num_seconds() as f64 / 60.0;
        let points = (bars[i].open - bars[i - 1].close).abs();
        if kind > worst.kind || (kind == worst.kind && points > worst.points) {
            worst = GapScan {
                kind,
                minutes,
                points,
            };
        }
    }
    worst
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(d: u32, h: u32, min: u32) -> NaiveDateTime {
        // January 2024: the 5th is a Friday, the 8th a Monday.
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_short_delta_is_no_gap() {
        let cfg = GapConfig::default();
        assert_eq!(classify_gap(ts(3, 10, 0), ts(3, 10, 44), &cfg), GapKind::NoGap);
    }

    #[test]
    fn test_generic_gap() {
        let cfg = GapConfig::default();
        assert_eq!(classify_gap(ts(3, 10, 0), ts(3, 11, 0), &cfg), GapKind::Gap);
    }

    #[test]
    fn test_daily_break_window() {
        let cfg = GapConfig::default();
        assert_eq!(classify_gap(ts(3, 16, 0), ts(3, 17, 30), &cfg), GapKind::DailyBreak);
        assert_eq!(classify_gap(ts(3, 18, 0), ts(3, 19, 30), &cfg), GapKind::DailyBreak);
    }

    #[test]
    fn test_weekend_gap_beats_daily_break_window() {
        // Friday 16:55 falls inside the daily-break hour window, but a
        // Friday-to-Monday jump must still classify as a weekend gap.
        let cfg = GapConfig::default();
        assert_eq!(
            classify_gap(ts(5, 16, 55), ts(8, 1, 0), &cfg),
            GapKind::WeekendGap
        );
    }

    #[test]
    fn test_friday_short_reopen_is_not_weekend() {
        // Below the weekend threshold the Friday transition degrades to
        // the daily-break/gap fallbacks.
        let cfg = GapConfig {
            daily_min: 45,
            weekend_min: 60,
        };
        assert_eq!(classify_gap(ts(5, 10, 0), ts(5, 10, 50), &cfg), GapKind::Gap);
    }

    #[test]
    fn test_severity_total_ordering() {
        assert!(GapKind::NoGap < GapKind::Gap);
        assert!(GapKind::Gap < GapKind::DailyBreak);
        assert!(GapKind::DailyBreak < GapKind::WeekendGap);
    }

    #[test]
    fn test_worst_gap_scan_prefers_severity_then_points() {
        let bar = |t: NaiveDateTime, open: f64, close: f64| Bar {
            timestamp: t,
            open,
            high: open.max(close),
            low: open.min(close),
            close,
        };
        let bars = vec![
            bar(ts(5, 10, 0), 100.0, 101.0),
            // Generic gap with a large price jump.
            bar(ts(5, 12, 0), 108.0, 108.5),
            // Friday afternoon bar, then the Monday reopen: weekend gap
            // with a smaller jump still wins on severity.
            bar(ts(5, 16, 0), 108.0, 108.2),
            bar(ts(8, 1, 0), 109.0, 109.5),
        ];
        let scan = worst_gap_in_range(&bars, 0, bars.len() - 1, &GapConfig::default());
        assert_eq!(scan.kind, GapKind::WeekendGap);
        assert!((scan.points - 0.8).abs() < 1e-9);
    }
}
