//! Overnight rollover counting for swap accrual.

use chrono::{Duration, NaiveDateTime, NaiveTime};

/// Count rollover-hour crossings between `open` and `reference`.
///
/// A crossing strictly after `open` counts; one landing exactly on
/// `reference` counts as well. Returns 0 when `reference` precedes or
/// equals `open`. Swap cost downstream is
/// `rollovers * total_lots * swap_rate(side)`.
pub fn count_rollovers(open: NaiveDateTime, reference: NaiveDateTime, rollover_hour: u32) -> u32 {
    if reference <= open {
        return 0;
    }
    let rollover_time =
        NaiveTime::from_hms_opt(rollover_hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    let mut first = open.date().and_time(rollover_time);
    if open >= first {
        first += Duration::days(1);
    }
    if reference < first {
        return 0;
    }
    ((reference - first).num_days() + 1) as u32
}
