//! Cost-aware structured plan
//!
//! Side comes from the last close against the EMA magnet, the stop from the
//! last few bars of structure. The first target sits deliberately close (0.8R),
//! so a plan whose net RR lands under [`MIN_RR`] is auto-adjusted: either a
//! tighter stop inside the recent structure or a first target moved out to the
//! magnet / measured move, whichever scores better after costs.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::bars::Bar;
use super::costs::{round_to_tick, rr_with_cost_config, Side};
use super::indicators::ema;
use crate::config::CostConfig;
use crate::error::LevelError;

/// Net RR a plan must reach before it is left alone
pub const MIN_RR: f64 = 1.5;

/// Bars of recent structure for the stop
const STRUCTURE_LOOKBACK: usize = 5;

/// Bars spanned by the measured move
const MEASURED_MOVE_LOOKBACK: usize = 20;

const T1_RISK_MULT: f64 = 0.8;
const T2_RISK_MULT: f64 = 1.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoAdjustment {
    TighterStop,
    LowerT1,
}

/// Height of the recent range projected from entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasuredMove {
    pub range_low: f64,
    pub range_high: f64,
    pub height: f64,
    pub target: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredPlan {
    pub side: Side,
    pub entry: f64,
    pub stop: f64,
    pub targets: [f64; 2],
    /// Net of fees and slippage, two decimals
    pub rr: f64,
    pub adjustment: Option<AutoAdjustment>,
    pub magnet: f64,
    pub measured_move: MeasuredMove,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn tail(bars: &[Bar], n: usize) -> &[Bar] {
    &bars[bars.len().saturating_sub(n)..]
}

fn max_of(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::MIN, f64::max)
}

fn min_of(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::MAX, f64::min)
}

fn measured_move(bars: &[Bar], side: Side, entry: f64, tick: f64) -> Result<MeasuredMove, LevelError> {
    let recent = tail(bars, MEASURED_MOVE_LOOKBACK);
    let range_low = min_of(recent.iter().map(|b| b.low));
    let range_high = max_of(recent.iter().map(|b| b.high));
    let height = round_to_tick((range_high - range_low).abs(), tick)?;
    let target = match side {
        Side::Long => round_to_tick(entry + height, tick)?,
        Side::Short => round_to_tick(entry - height, tick)?,
    };

    Ok(MeasuredMove {
        range_low,
        range_high,
        height,
        target,
    })
}

/// Build the plan from closed bars only.
///
/// Prices are tick-rounded with `costs.tick_size`; the magnet is the EMA of
/// closes over `ema_period` bars.
pub fn build_structured_plan(
    bars: &[Bar],
    costs: &CostConfig,
    ema_period: usize,
) -> Result<StructuredPlan, LevelError> {
    let last = bars.last().ok_or(LevelError::EmptyWindow)?;
    let tick = costs.tick_size;

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let magnet = round_to_tick(ema(&closes, ema_period)?, tick)?;

    let side = if last.close >= magnet { Side::Long } else { Side::Short };
    let entry = round_to_tick(last.close, tick)?;

    let structure = tail(bars, STRUCTURE_LOOKBACK);
    let mut stop = match side {
        Side::Long => round_to_tick(min_of(structure.iter().map(|b| b.low)), tick)?,
        Side::Short => round_to_tick(max_of(structure.iter().map(|b| b.high)), tick)?,
    };

    let risk = (entry - stop).abs();
    let (t1_offset, t2_offset) = (tick.max(risk * T1_RISK_MULT), risk * T2_RISK_MULT);
    let (mut t1, t2) = match side {
        Side::Long => (round_to_tick(entry + t1_offset, tick)?, round_to_tick(entry + t2_offset, tick)?),
        Side::Short => (round_to_tick(entry - t1_offset, tick)?, round_to_tick(entry - t2_offset, tick)?),
    };

    let mut rr = round2(rr_with_cost_config(entry, stop, t1, side, costs)?);
    let measured = measured_move(bars, side, entry, tick)?;
    let mut adjustment = None;

    if rr < MIN_RR {
        let tight_stop = match side {
            Side::Long => round_to_tick(max_of(structure.iter().map(|b| b.low)) + tick, tick)?.min(entry - tick),
            Side::Short => round_to_tick(min_of(structure.iter().map(|b| b.high)) - tick, tick)?.max(entry + tick),
        };
        let rr_tight = round2(rr_with_cost_config(entry, tight_stop, t1, side, costs)?);

        let magnet_ahead = match side {
            Side::Long => magnet > entry,
            Side::Short => magnet < entry,
        };
        let lower_t1 = if magnet_ahead { magnet } else { measured.target };
        let rr_lower = round2(rr_with_cost_config(entry, stop, lower_t1, side, costs)?);

        debug!(
            "RR {:.2} below {:.1}: tighter stop {} -> {:.2}, lower T1 {} -> {:.2}",
            rr, MIN_RR, tight_stop, rr_tight, lower_t1, rr_lower
        );

        if rr_tight >= MIN_RR && rr_tight >= rr_lower {
            stop = tight_stop;
            rr = rr_tight;
            adjustment = Some(AutoAdjustment::TighterStop);
        } else {
            t1 = lower_t1;
            rr = rr_lower;
            adjustment = Some(AutoAdjustment::LowerT1);
        }
    }

    info!(
        "{} plan: entry {} stop {} targets [{}, {}] rr {:.2} adjustment {:?}",
        side, entry, stop, t1, t2, rr, adjustment
    );

    Ok(StructuredPlan {
        side,
        entry,
        stop,
        targets: [t1, t2],
        rr,
        adjustment,
        magnet,
        measured_move: measured,
    })
}
