//! Trade plan construction from levels and ATR
//!
//! - Long: entry near current price or a close support, stop under the
//!   nearest support, targets at 1R and at the nearest resistance (or 2R)
//! - Short: mirror image around the nearest resistance
//! - Neutral: breakout/breakdown triggers and a short watch list

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use super::bars::Bar;
use super::costs::Side;
use super::indicators::average_true_range;
use super::support_resistance::{calculate_support_resistance, ReportedLevel, SupportResistance};
use crate::config::LevelConfig;
use crate::error::LevelError;

/// A support/resistance level closer than this (percent) becomes the entry anchor
const ENTRY_PROXIMITY_PCT: f64 = 2.0;

/// An opposing level closer than this (percent) becomes the second target
const TARGET_PROXIMITY_PCT: f64 = 10.0;

/// Entry zone width on the adverse side, in ATR
const ENTRY_ADVERSE_ATR: f64 = 0.5;

/// Entry zone width on the favourable side, in ATR
const ENTRY_FAVOURABLE_ATR: f64 = 0.2;

/// Stop buffer beyond the anchoring level, in ATR
const STOP_BUFFER_ATR: f64 = 0.5;

/// Stop distance when no level exists, in ATR
const FALLBACK_STOP_ATR: f64 = 2.0;

/// R multiple of the fallback second target
const FALLBACK_TARGET_R: f64 = 2.0;

/// Watch levels reported per side for a neutral read
const WATCH_LEVELS: usize = 2;

/// Directional bias handed in by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
    Neutral,
}

impl Direction {
    /// Map a signal word onto a direction: `long`/`buy` and `short`/`sell`
    /// (any case), everything else is neutral
    pub fn from_signal(signal: &str) -> Self {
        match signal.trim().to_ascii_lowercase().as_str() {
            "long" | "buy" => Direction::Long,
            "short" | "sell" => Direction::Short,
            _ => Direction::Neutral,
        }
    }

    pub fn side(&self) -> Option<Side> {
        match self {
            Direction::Long => Some(Side::Long),
            Direction::Short => Some(Side::Short),
            Direction::Neutral => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
            Direction::Neutral => write!(f, "neutral"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntryRange {
    pub min: f64,
    pub max: f64,
}

/// Entry, stop and targets for a long or short
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradePlan {
    pub direction: Direction,
    pub entry_base: f64,
    pub entry_range: EntryRange,
    pub stop_loss: f64,
    pub targets: Vec<f64>,
    pub risk_pct: f64,
    /// |target - entry_base| / risk, aligned with `targets`
    pub reward_ratios: Vec<f64>,
}

/// Levels to watch when there is no directional bias
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchPlan {
    /// Nearest resistance, or one ATR above price
    pub bullish_breakout: f64,
    /// Nearest support, or one ATR below price
    pub bearish_breakdown: f64,
    pub watch_resistances: Vec<ReportedLevel>,
    pub watch_supports: Vec<ReportedLevel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TradeSetup {
    Directional(TradePlan),
    Neutral(WatchPlan),
}

impl TradeSetup {
    pub fn plan(&self) -> Option<&TradePlan> {
        match self {
            TradeSetup::Directional(plan) => Some(plan),
            TradeSetup::Neutral(_) => None,
        }
    }
}

fn within(level: Option<&ReportedLevel>, pct: f64) -> Option<f64> {
    level.filter(|l| l.distance_pct < pct).map(|l| l.price)
}

fn finish_plan(
    direction: Direction,
    entry_base: f64,
    entry_range: EntryRange,
    stop_loss: f64,
    targets: Vec<f64>,
) -> TradePlan {
    let risk = (entry_base - stop_loss).abs();
    let reward_ratios = targets
        .iter()
        .map(|t| if risk > 0.0 { (t - entry_base).abs() / risk } else { 0.0 })
        .collect();

    TradePlan {
        direction,
        entry_base,
        entry_range,
        stop_loss,
        targets,
        risk_pct: risk / entry_base * 100.0,
        reward_ratios,
    }
}

fn long_plan(current_price: f64, atr: f64, levels: &SupportResistance) -> TradePlan {
    let support = levels.nearest_support();

    let entry_base = within(support, ENTRY_PROXIMITY_PCT).unwrap_or(current_price);
    let entry_range = EntryRange {
        min: entry_base - atr * ENTRY_ADVERSE_ATR,
        max: entry_base + atr * ENTRY_FAVOURABLE_ATR,
    };
    let stop_loss = support
        .map(|s| s.price - atr * STOP_BUFFER_ATR)
        .unwrap_or(current_price - atr * FALLBACK_STOP_ATR);

    let risk = (entry_base - stop_loss).abs();
    let targets = vec![
        entry_base + risk,
        within(levels.nearest_resistance(), TARGET_PROXIMITY_PCT)
            .unwrap_or(entry_base + risk * FALLBACK_TARGET_R),
    ];

    finish_plan(Direction::Long, entry_base, entry_range, stop_loss, targets)
}

fn short_plan(current_price: f64, atr: f64, levels: &SupportResistance) -> TradePlan {
    let resistance = levels.nearest_resistance();

    let entry_base = within(resistance, ENTRY_PROXIMITY_PCT).unwrap_or(current_price);
    let entry_range = EntryRange {
        min: entry_base - atr * ENTRY_FAVOURABLE_ATR,
        max: entry_base + atr * ENTRY_ADVERSE_ATR,
    };
    let stop_loss = resistance
        .map(|r| r.price + atr * STOP_BUFFER_ATR)
        .unwrap_or(current_price + atr * FALLBACK_STOP_ATR);

    let risk = (stop_loss - entry_base).abs();
    let targets = vec![
        entry_base - risk,
        within(levels.nearest_support(), TARGET_PROXIMITY_PCT)
            .unwrap_or(entry_base - risk * FALLBACK_TARGET_R),
    ];

    finish_plan(Direction::Short, entry_base, entry_range, stop_loss, targets)
}

fn watch_plan(current_price: f64, atr: f64, levels: &SupportResistance) -> WatchPlan {
    WatchPlan {
        bullish_breakout: levels
            .nearest_resistance()
            .map(|r| r.price)
            .unwrap_or(current_price + atr),
        bearish_breakdown: levels
            .nearest_support()
            .map(|s| s.price)
            .unwrap_or(current_price - atr),
        watch_resistances: levels.resistances.iter().take(WATCH_LEVELS).copied().collect(),
        watch_supports: levels.supports.iter().take(WATCH_LEVELS).copied().collect(),
    }
}

/// Build the setup for `direction` from already selected levels
pub fn build_trade_setup(
    direction: Direction,
    current_price: f64,
    atr: f64,
    levels: &SupportResistance,
) -> TradeSetup {
    match direction {
        Direction::Long => TradeSetup::Directional(long_plan(current_price, atr, levels)),
        Direction::Short => TradeSetup::Directional(short_plan(current_price, atr, levels)),
        Direction::Neutral => TradeSetup::Neutral(watch_plan(current_price, atr, levels)),
    }
}

/// Levels, ATR and setup in one pass over the window
pub fn calculate_entry_exit_points(
    bars: &[Bar],
    direction: Direction,
    config: &LevelConfig,
) -> Result<TradeSetup, LevelError> {
    let current_price = bars.last().ok_or(LevelError::EmptyWindow)?.close;
    let atr = average_true_range(bars, config.atr_period).ok_or(LevelError::InvalidPeriod)?;
    let levels = calculate_support_resistance(bars, config)?;

    let setup = build_trade_setup(direction, current_price, atr, &levels);
    if let Some(plan) = setup.plan() {
        info!(
            "{} plan: entry {:.2} stop {:.2} targets {:?} (risk {:.2}%)",
            direction, plan.entry_base, plan.stop_loss, plan.targets, plan.risk_pct
        );
    } else {
        info!("Neutral read at {:.2}, ATR {:.2}", current_price, atr);
    }

    Ok(setup)
}
