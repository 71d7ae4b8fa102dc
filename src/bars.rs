//! OHLC bar types shared by the loader and the simulation core.

use anyhow::{bail, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Single OHLC bar. Timestamps are naive local times in the reference
/// timezone (see [`crate::sessions::REFERENCE_TZ`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Ordered OHLC history.
///
/// Construction enforces strictly increasing timestamps; sorting and
/// de-duplication are the ingestion layer's job (see [`crate::data`]).
#[derive(Debug, Clone)]
pub struct PriceSeries {
    bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(bars: Vec<Bar>) -> Result<Self> {
        for pair in bars.windows(2) {
            if pair[1].timestamp <= pair[0].timestamp {
                bail!(
                    "price series timestamps must be strictly increasing ({} followed by {})",
                    pair[0].timestamp,
                    pair[1].timestamp
                );
            }
        }
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(minute: u32, price: f64) -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 4)
                .unwrap()
                .and_hms_opt(10, minute, 0)
                .unwrap(),
            open: price,
            high: price,
            low: price,
            close: price,
        }
    }

    #[test]
    fn test_accepts_increasing_timestamps() {
        let series = PriceSeries::new(vec![bar(0, 100.0), bar(1, 101.0), bar(2, 102.0)]);
        assert_eq!(series.unwrap().len(), 3);
    }

    #[test]
    fn test_rejects_duplicate_timestamps() {
        assert!(PriceSeries::new(vec![bar(0, 100.0), bar(0, 101.0)]).is_err());
    }

    #[test]
    fn test_rejects_unordered_timestamps() {
        assert!(PriceSeries::new(vec![bar(5, 100.0), bar(1, 101.0)]).is_err());
    }
}
