use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use grid_ruin::data::load_bars_csv;
use grid_ruin::plan::LotScaling;
use grid_ruin::presets::{BuiltinPresets, PresetProvider};
use grid_ruin::sessions::Session;
use grid_ruin::simulation::summary::{summarize, RuinSummary};
use grid_ruin::simulation::{run_with_progress, RunConfig, SimulationParameters, SimulationResult};

#[derive(Parser, Debug)]
#[command(name = "grid-ruin")]
#[command(about = "Monte Carlo risk-of-ruin estimation for martingale grid strategies")]
struct Args {
    /// CSV file with timestamp,open,high,low,close bars
    #[arg(short, long)]
    file: PathBuf,

    /// Instrument symbol used for preset lookup (e.g. XAUUSD)
    #[arg(short = 'y', long, default_value = "XAUUSD")]
    symbol: String,

    /// Number of Monte Carlo samples (each runs a BUY and a SELL trade)
    #[arg(short = 'n', long, default_value = "1000")]
    samples: usize,

    /// Seed for reproducible sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Grid level distance (preset default when omitted)
    #[arg(long)]
    distance: Option<f64>,

    /// Initial lot size
    #[arg(long, default_value = "0.01")]
    lot0: f64,

    /// Lot multiplier applied at every addition when no staged plan is given
    #[arg(long, default_value = "2.0")]
    q0: f64,

    /// Maximum total entries when no staged plan is given
    #[arg(long, default_value = "10")]
    max_steps: u32,

    /// Staged plan, e.g. "10:1.1,5:1.2" (count:multiplier segments)
    #[arg(long, default_value = "")]
    plan: String,

    /// Take-profit offset beyond the average entry (preset default when omitted)
    #[arg(long)]
    tp_offset: Option<f64>,

    /// Global stop loss in USD, must be negative (preset default when omitted)
    #[arg(long, allow_hyphen_values = true)]
    stop_loss: Option<f64>,

    /// Local hour that starts a new overnight swap charge
    #[arg(long, default_value = "16")]
    rollover_hour: u32,

    /// Drawdown thresholds in USD whose first crossing is recorded
    #[arg(long, value_delimiter = ',', default_value = "1000,5000,10000,25000")]
    dd_thresholds: Vec<f64>,

    /// Write per-trade results to this CSV file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the summary as JSON instead of the text report
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("grid_ruin=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let preset = BuiltinPresets.preset_or_default(&args.symbol);

    let scaling = LotScaling::parse(&args.plan, args.q0, args.max_steps)?;
    let params = SimulationParameters {
        distance: args.distance.unwrap_or(preset.distance),
        lot0: args.lot0,
        scaling,
        tp_offset: args.tp_offset.unwrap_or(preset.tp_offset),
        stop_loss: args.stop_loss.unwrap_or(preset.stop_loss),
        contract_size: preset.contract_size,
        swap_long: preset.swap_long,
        swap_short: preset.swap_short,
        rollover_hour: args.rollover_hour,
        sessions_enabled: preset.sessions_enabled,
        dd_thresholds: args.dd_thresholds.clone(),
    };

    let series = load_bars_csv(&args.file)?;
    info!(symbol = %args.symbol, bars = series.len(), "starting batch");

    let config = RunConfig {
        samples: args.samples,
        seed: args.seed,
        ..Default::default()
    };
    let batch = run_with_progress(&series, &params, &config, |done, total| {
        if done % 200 == 0 || done == total {
            eprint!("\r[{done}/{total}] samples");
        }
    })?;
    eprintln!();

    if let Some(path) = &args.output {
        write_results_csv(path, &batch.results)?;
        println!("Results written to {:?}", path);
    }

    let summary = summarize(&batch.results);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_report(&args.symbol, &params, &summary);
    }

    Ok(())
}

fn session_cell(session: Option<Session>) -> String {
    session.map(|s| s.to_string()).unwrap_or_else(|| "-".into())
}

/// Write the per-trade result table as CSV.
fn write_results_csv(path: &Path, results: &[SimulationResult]) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writeln!(
        file,
        "side,broke,outcome,dd_peak,entries_used,duration_bars,start_ts,end_ts,\
         start_session,end_session,swap_usd,exit_pnl_usd,dd_first_cross"
    )?;
    for result in results {
        let crossings = result
            .dd_first_cross
            .iter()
            .map(|c| c.map(|bar| bar.to_string()).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(";");
        writeln!(
            file,
            "{},{},{},{:.2},{},{},{},{},{},{},{:.2},{:.2},{}",
            result.side,
            result.broke,
            result.outcome,
            result.dd_peak,
            result.entries_used,
            result.duration_bars,
            result.start_ts,
            result.end_ts,
            session_cell(result.start_session),
            session_cell(result.end_session),
            result.swap_usd,
            result.exit_pnl_usd,
            crossings
        )?;
    }
    Ok(())
}

fn print_report(symbol: &str, params: &SimulationParameters, summary: &RuinSummary) {
    println!("\n{}", "=".repeat(60));
    println!("GRID RISK OF RUIN - {}", symbol);
    println!("{}", "=".repeat(60));
    println!(
        "Max total volume: {:.2} lots",
        params.scaling.total_lots(params.lot0)
    );
    println!("Stop loss: ${:.0}", params.stop_loss);
    println!();
    println!("SIMULATED TRADES: {}", summary.trades);
    println!("{}", "-".repeat(40));
    println!(
        "  RUINED:         {} ({:.2}%)",
        summary.ruined,
        summary.ruin_rate * 100.0
    );
    println!("  Take profit:    {}", summary.take_profit);
    println!("  End of data:    {}", summary.end_of_data);
    println!();
    println!("  Worst drawdown: ${:.0}", summary.dd_worst);
    println!("  Mean drawdown:  ${:.0}", summary.dd_mean);
    println!("  P95 drawdown:   ${:.0}", summary.dd_p95);
    println!(
        "  Avg entries:    {:.1} (max {})",
        summary.avg_entries, summary.max_entries
    );
    println!("  Avg duration:   {:.0} bars", summary.avg_duration_bars);
    println!("  Avg swap:       ${:.2}", summary.avg_swap_usd);
    println!("  Avg exit P&L:   ${:.2}", summary.avg_exit_pnl_usd);
    println!();
    println!(
        "  BUY:  {}/{} ruined ({:.2}%)",
        summary.buy.ruined,
        summary.buy.trades,
        summary.buy.ruin_rate * 100.0
    );
    println!(
        "  SELL: {}/{} ruined ({:.2}%)",
        summary.sell.ruined,
        summary.sell.trades,
        summary.sell.ruin_rate * 100.0
    );
    if !summary.sessions.is_empty() {
        println!("\n  By start session:");
        for breakdown in &summary.sessions {
            println!(
                "    {:8} {}/{} ruined ({:.2}%)",
                breakdown.session,
                breakdown.counts.ruined,
                breakdown.counts.trades,
                breakdown.counts.ruin_rate * 100.0
            );
        }
    }
    println!("{}", "=".repeat(60));
}
