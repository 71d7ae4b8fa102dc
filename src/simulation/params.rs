//! Simulation parameter set and validation.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::plan::LotScaling;

/// Immutable parameter set for one Monte Carlo run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationParameters {
    /// Price distance between consecutive grid levels.
    pub distance: f64,
    /// Initial entry size in lots.
    pub lot0: f64,
    /// Lot multiplier plan across grid additions.
    pub scaling: LotScaling,
    /// Favorable distance beyond the volume-weighted average entry that
    /// closes the trade in profit.
    pub tp_offset: f64,
    /// Negative USD drawdown threshold that forces ruin.
    pub stop_loss: f64,
    /// Units per lot; converts price deltas to currency.
    pub contract_size: f64,
    /// Per-lot per-night carry for longs (USD).
    pub swap_long: f64,
    /// Per-lot per-night carry for shorts (USD).
    pub swap_short: f64,
    /// Local hour at which a new overnight charge starts.
    pub rollover_hour: u32,
    /// Whether FX session labels apply to this instrument.
    pub sessions_enabled: bool,
    /// Drawdown levels in USD whose first crossing is recorded.
    pub dd_thresholds: Vec<f64>,
}

impl SimulationParameters {
    /// Reject configurations the simulator cannot run. The policy is
    /// rejection, not coercion: a non-negative stop loss is an error.
    pub fn validate(&self) -> Result<()> {
        if self.stop_loss >= 0.0 {
            bail!(
                "stop_loss must be a negative USD threshold (got {})",
                self.stop_loss
            );
        }
        if self.distance <= 0.0 {
            bail!("distance must be > 0 (got {})", self.distance);
        }
        if self.lot0 <= 0.0 {
            bail!("lot0 must be > 0 (got {})", self.lot0);
        }
        if self.contract_size <= 0.0 {
            bail!("contract_size must be > 0 (got {})", self.contract_size);
        }
        if self.rollover_hour > 23 {
            bail!("rollover_hour must be 0-23 (got {})", self.rollover_hour);
        }
        match &self.scaling {
            LotScaling::Uniform {
                multiplier,
                max_steps,
            } => {
                if *max_steps == 0 {
                    bail!("max_steps must be >= 1");
                }
                if *multiplier <= 0.0 {
                    bail!("lot multiplier must be > 0 (got {multiplier})");
                }
            }
            LotScaling::Staged(segments) => {
                if segments.is_empty() {
                    bail!("staged plan must have at least one segment");
                }
                for segment in segments {
                    if segment.count == 0 || segment.multiplier <= 0.0 {
                        bail!(
                            "staged segment {}:{} is invalid",
                            segment.count,
                            segment.multiplier
                        );
                    }
                }
            }
        }
        Ok(())
    }
}
