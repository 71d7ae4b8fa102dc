//! CSV bar loading for the CLI.
//!
//! A deliberately thin stand-in for a full MT5 ingestion pipeline: reads
//! `timestamp,open,high,low,close` rows (ISO or MT5 dotted timestamps),
//! sorts them, and keeps the last bar per timestamp, which is the
//! contract the simulation core assumes from its ingestion layer.
//! Encoding detection and multi-file merging stay outside this crate.

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use std::path::Path;
use tracing::info;

use crate::bars::{Bar, PriceSeries};

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
];

fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(ts);
        }
    }
    bail!("unrecognized timestamp `{text}`")
}

/// Load a bar CSV into a validated [`PriceSeries`].
pub fn load_bars_csv(path: &Path) -> Result<PriceSeries> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut bars = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let line = row + 2;
        let record = record.with_context(|| format!("bad CSV record at line {line}"))?;
        if record.len() < 5 {
            bail!("line {line}: expected timestamp,open,high,low,close");
        }
        let timestamp =
            parse_timestamp(&record[0]).with_context(|| format!("line {line}: bad timestamp"))?;
        let field = |i: usize, name: &str| -> Result<f64> {
            record[i]
                .parse::<f64>()
                .with_context(|| format!("line {line}: bad {name}"))
        };
        bars.push(Bar {
            timestamp,
            open: field(1, "open")?,
            high: field(2, "high")?,
            low: field(3, "low")?,
            close: field(4, "close")?,
        });
    }

    // Ingestion contract: sorted, keep-last de-duplication.
    bars.sort_by_key(|bar| bar.timestamp);
    bars.reverse();
    bars.dedup_by_key(|bar| bar.timestamp);
    bars.reverse();

    info!(bars = bars.len(), path = %path.display(), "loaded price series");
    PriceSeries::new(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("grid_ruin_bars_{}.csv", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_loads_and_deduplicates() {
        let path = write_temp(
            "timestamp,open,high,low,close\n\
             2024-01-02 10:01:00,101,102,100,101.5\n\
             2024-01-02 10:00:00,100,101,99,100.5\n\
             2024-01-02 10:00:00,100.1,101.1,99.1,100.6\n",
        );
        let series = load_bars_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();

        // Sorted, and the later duplicate of 10:00 wins.
        assert_eq!(series.len(), 2);
        assert!((series.bars()[0].open - 100.1).abs() < 1e-12);
        assert!((series.bars()[1].open - 101.0).abs() < 1e-12);
    }

    #[test]
    fn test_accepts_mt5_dotted_timestamps() {
        assert!(parse_timestamp("2024.01.02 10:00").is_ok());
        assert!(parse_timestamp("2024.01.02 10:00:30").is_ok());
        assert!(parse_timestamp("02/01/2024 10:00").is_err());
    }
}
