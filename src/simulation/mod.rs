//! Simulation core: grid-trade state machine and Monte Carlo driver.
//!
//! - Parameter set and fatal-config validation
//! - Grid position bookkeeping (entries, lots, PMP)
//! - Start-index sampling with lookahead degradation
//! - Per-trade state machine over an explicit accumulator
//! - Parallel, order-deterministic Monte Carlo runner
//! - Result-set summary statistics

pub mod params;
pub mod position;
pub mod runner;
pub mod sampler;
pub mod simulator;
pub mod summary;

// Re-export commonly used types
pub use params::SimulationParameters;
pub use position::{GridPosition, Side};
pub use runner::{run, run_with_progress, MonteCarloRun, RunConfig};
pub use sampler::{sample_starts, SampledStarts, DEFAULT_LOOKAHEAD};
pub use simulator::{
    simulate_trade, step_bar, CloseReason, DrawdownTrace, SimulationResult, TradeAccumulator,
    TradeState,
};
pub use summary::{summarize, RuinSummary};
