use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use levelplan::analysis::{
    average_true_range, build_structured_plan, calculate_entry_exit_points,
    calculate_support_resistance, ema, load_bars, round_to_tick, rr_with_cost_config, Direction,
    StructuredPlan, SupportResistance,
};
use levelplan::config::{AppConfig, CostConfig};

#[derive(Parser, Debug)]
#[command(name = "levelplan")]
#[command(about = "Support/resistance levels and cost-aware trade plans from OHLCV bars")]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Print verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report support/resistance with ATR and EMA
    Levels {
        /// Bar file (CSV or .csv.zst)
        #[arg(short, long)]
        bars: PathBuf,

        /// JSON config file
        #[arg(short, long, env = "LEVELPLAN_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Build an entry/stop/target plan for a direction
    Plan {
        #[arg(short, long)]
        bars: PathBuf,

        /// long/buy, short/sell, anything else is neutral
        #[arg(short, long, default_value = "neutral")]
        direction: String,

        #[arg(short, long, env = "LEVELPLAN_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Cost-aware structured plan for one or more bar files
    Analyze {
        #[arg(short, long, num_args = 1.., required = true)]
        bars: Vec<PathBuf>,

        #[arg(short, long, env = "LEVELPLAN_CONFIG")]
        config: Option<PathBuf>,

        #[command(flatten)]
        costs: CostArgs,
    },

    /// Risk-reward after fees and slippage
    Rr {
        #[arg(long)]
        entry: f64,

        #[arg(long)]
        stop: f64,

        #[arg(long)]
        target: f64,

        /// long/buy or short/sell
        #[arg(long)]
        side: String,

        #[command(flatten)]
        costs: CostArgs,
    },

    /// Round a price to the tick grid
    Round {
        #[arg(long)]
        price: f64,

        #[arg(long, default_value = "0.01")]
        tick_size: f64,
    },
}

/// Venue cost overrides, applied on top of the config file
#[derive(ClapArgs, Debug)]
struct CostArgs {
    #[arg(long, env = "LEVELPLAN_TICK_SIZE")]
    tick_size: Option<f64>,

    #[arg(long, env = "LEVELPLAN_FEES_BPS")]
    fees_bps: Option<f64>,

    #[arg(long, env = "LEVELPLAN_SLIPPAGE_TICKS")]
    slippage_ticks: Option<i64>,
}

impl CostArgs {
    fn apply(&self, mut costs: CostConfig) -> CostConfig {
        if let Some(tick_size) = self.tick_size {
            costs.tick_size = tick_size;
        }
        if let Some(fees_bps) = self.fees_bps {
            costs.fees_bps = fees_bps;
        }
        if let Some(slippage_ticks) = self.slippage_ticks {
            costs.slippage_ticks = slippage_ticks;
        }
        costs
    }
}

#[derive(Debug, Serialize)]
struct LevelAnalysis {
    #[serde(flatten)]
    levels: SupportResistance,
    atr: Option<f64>,
    ema: f64,
}

#[derive(Debug, Serialize)]
struct FilePlan {
    file: String,
    bars: usize,
    plan: StructuredPlan,
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::from_json_file(path),
        None => Ok(AppConfig::default()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_levels(bars_path: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let bars = load_bars(bars_path)?;

    let levels = calculate_support_resistance(&bars, &config.levels)
        .with_context(|| format!("Failed to compute levels for {}", bars_path.display()))?;
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    print_json(&LevelAnalysis {
        levels,
        atr: average_true_range(&bars, config.levels.atr_period),
        ema: ema(&closes, config.levels.ema_period)?,
    })
}

fn run_plan(bars_path: &Path, direction: &str, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let bars = load_bars(bars_path)?;

    let setup = calculate_entry_exit_points(&bars, Direction::from_signal(direction), &config.levels)
        .with_context(|| format!("Failed to build plan for {}", bars_path.display()))?;
    print_json(&setup)
}

fn run_analyze(files: &[PathBuf], config_path: Option<&Path>, cost_args: &CostArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let costs = cost_args.apply(config.costs);
    let ema_period = config.levels.ema_period;

    info!(
        "Analyzing {} files (tick {}, {} bps, {} ticks slippage)",
        files.len(),
        costs.tick_size,
        costs.fees_bps,
        costs.slippage_ticks
    );

    let results: Vec<Result<FilePlan>> = files
        .par_iter()
        .map(|path| -> Result<FilePlan> {
            let bars = load_bars(path)?;
            let plan = build_structured_plan(&bars, &costs, ema_period)
                .with_context(|| format!("Failed to plan {}", path.display()))?;
            Ok(FilePlan {
                file: path.display().to_string(),
                bars: bars.len(),
                plan,
            })
        })
        .collect();

    let mut plans = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(plan) => plans.push(plan),
            Err(e) => warn!("Skipping file: {:#}", e),
        }
    }

    if plans.is_empty() {
        bail!("No file produced a plan");
    }
    print_json(&plans)
}

fn run_rr(entry: f64, stop: f64, target: f64, side: &str, cost_args: &CostArgs) -> Result<()> {
    let Some(side) = Direction::from_signal(side).side() else {
        bail!("Side must be long/buy or short/sell, got '{}'", side);
    };
    let costs = cost_args.apply(CostConfig::default());

    let rr = rr_with_cost_config(entry, stop, target, side, &costs)?;
    print_json(&serde_json::json!({ "side": side, "rr": rr, "costs": costs }))
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let directive = if args.verbose { "levelplan=debug" } else { "levelplan=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Commands::Levels { bars, config } => run_levels(&bars, config.as_deref()),
        Commands::Plan { bars, direction, config } => run_plan(&bars, &direction, config.as_deref()),
        Commands::Analyze { bars, config, costs } => run_analyze(&bars, config.as_deref(), &costs),
        Commands::Rr { entry, stop, target, side, costs } => run_rr(entry, stop, target, &side, &costs),
        Commands::Round { price, tick_size } => print_json(&round_to_tick(price, tick_size)?),
    }
}
