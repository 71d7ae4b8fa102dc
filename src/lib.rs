// Library crate - simulation core and shared time-context utilities

pub mod bars;
pub mod data;
pub mod drawdowns;
pub mod gaps;
pub mod plan;
pub mod presets;
pub mod rollover;
pub mod sessions;
pub mod simulation;

// Re-export commonly used types
pub use bars::{Bar, PriceSeries};
pub use drawdowns::{drawdown_events, DrawdownEvent};
pub use gaps::{classify_gap, worst_gap_in_range, GapConfig, GapKind};
pub use plan::{LotScaling, MultiplierSchedule, PlanSegment};
pub use presets::{BuiltinPresets, InstrumentPreset, PresetProvider};
pub use rollover::count_rollovers;
pub use sessions::{session_label, Session};
pub use simulation::{
    run, run_with_progress, CloseReason, MonteCarloRun, RunConfig, Side, SimulationParameters,
    SimulationResult,
};
