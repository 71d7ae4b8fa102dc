//! Monte Carlo driver: samples starting bars and fans the per-trade
//! simulations out across the rayon pool.

use anyhow::{bail, Result};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};

use crate::bars::PriceSeries;

use super::params::SimulationParameters;
use super::position::Side;
use super::sampler::{sample_starts, SampledStarts, DEFAULT_LOOKAHEAD};
use super::simulator::{simulate_trade, SimulationResult};

/// Batch settings for one Monte Carlo run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Number of sampled starting bars; each yields a BUY and a SELL trade.
    pub samples: usize,
    /// Future bars reserved per grid level when choosing starts.
    pub lookahead: usize,
    /// Seed for reproducible sampling; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            samples: 1000,
            lookahead: DEFAULT_LOOKAHEAD,
            seed: None,
        }
    }
}

/// Completed batch: results ordered by sample index then side (BUY
/// before SELL), plus the sampling diagnostics.
#[derive(Debug, Clone)]
pub struct MonteCarloRun {
    pub results: Vec<SimulationResult>,
    pub starts: SampledStarts,
}

/// Run a batch without progress reporting.
pub fn run(
    series: &PriceSeries,
    params: &SimulationParameters,
    config: &RunConfig,
) -> Result<MonteCarloRun> {
    run_with_progress(series, params, config, |_, _| {})
}

/// Run a batch, reporting `(completed, total)` sample counts as work
/// finishes. Simulations are independent and run in parallel; results
/// are still collected in submission order, so a seeded run is
/// bit-for-bit reproducible regardless of thread timing.
pub fn run_with_progress(
    series: &PriceSeries,
    params: &SimulationParameters,
    config: &RunConfig,
    progress: impl Fn(usize, usize) + Sync,
) -> Result<MonteCarloRun> {
    params.validate()?;
    if series.is_empty() {
        bail!("price series is empty");
    }
    if config.samples == 0 {
        bail!("sample count must be >= 1");
    }

    let max_levels = params.scaling.max_additions() as usize;
    let starts = sample_starts(
        series.len(),
        max_levels,
        config.samples,
        config.lookahead,
        config.seed,
    );
    if let Some(note) = &starts.note {
        warn!("{note}");
    }

    info!(
        samples = config.samples,
        bars = series.len(),
        lookahead = starts.lookahead,
        "running Monte Carlo batch"
    );

    let bars = series.bars();
    let total = starts.indices.len();
    let completed = AtomicUsize::new(0);

    let results: Vec<SimulationResult> = starts
        .indices
        .par_iter()
        .flat_map_iter(|&idx| {
            let pair = [
                simulate_trade(bars, idx, Side::Buy, params),
                simulate_trade(bars, idx, Side::Sell, params),
            ];
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            progress(done, total);
            pair.into_iter()
        })
        .collect();

    Ok(MonteCarloRun { results, starts })
}
