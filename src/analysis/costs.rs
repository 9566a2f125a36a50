//! Tick-grid rounding and risk-reward net of fees and slippage

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::CostConfig;
use crate::error::LevelError;

/// Side of a position for cost evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

/// Decimal places implied by the tick as printed, e.g. 0.25 -> 2, 1.0 -> 0
pub fn tick_decimals(tick: f64) -> i32 {
    let printed = format!("{:.12}", tick);
    let trimmed = printed.trim_end_matches('0').trim_end_matches('.');
    trimmed
        .split_once('.')
        .map(|(_, frac)| frac.len() as i32)
        .unwrap_or(0)
}

fn round_decimals(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Round a price to the nearest multiple of `tick`.
///
/// Ties go to the even step. The result is re-expressed at the tick's own
/// decimal precision so `3405.25` never comes back as `3405.2500000000005`.
pub fn round_to_tick(price: f64, tick: f64) -> Result<f64, LevelError> {
    if tick.is_nan() || tick <= 0.0 {
        return Err(LevelError::InvalidTick(tick));
    }
    let steps = (price / tick).round_ties_even();
    Ok(round_decimals(steps * tick, tick_decimals(tick)))
}

/// Risk-reward multiple after adverse slippage and taker fees.
///
/// Slippage of `slippage_ticks * tick` worsens every fill. Fees of
/// `fees_bps / 10_000` are charged on the entry notional and on the exit
/// notional of each leg. Returns `net_reward / net_risk` floored at zero, and
/// exactly `0.0` whenever net risk is not positive.
pub fn rr_with_costs(
    entry: f64,
    stop: f64,
    target: f64,
    side: Side,
    tick: f64,
    fees_bps: f64,
    slippage_ticks: i64,
) -> Result<f64, LevelError> {
    if tick.is_nan() || tick <= 0.0 {
        return Err(LevelError::InvalidTick(tick));
    }
    if fees_bps.is_nan() || fees_bps < 0.0 {
        return Err(LevelError::NegativeFees(fees_bps));
    }
    if slippage_ticks < 0 {
        return Err(LevelError::NegativeSlippage(slippage_ticks));
    }

    let slip = slippage_ticks as f64 * tick;

    let (entry_eff, stop_eff, target_eff, gross_risk, gross_reward) = match side {
        Side::Long => {
            let (e, s, t) = (entry + slip, stop - slip, target - slip);
            (e, s, t, e - s, t - e)
        }
        Side::Short => {
            let (e, s, t) = (entry - slip, stop + slip, target + slip);
            (e, s, t, s - e, e - t)
        }
    };

    let fee_rate = fees_bps / 10_000.0;
    let fees_entry = entry_eff.abs() * fee_rate;
    let fees_exit_stop = stop_eff.abs() * fee_rate;
    let fees_exit_target = target_eff.abs() * fee_rate;

    let net_risk = gross_risk + fees_entry + fees_exit_stop;
    let net_reward = gross_reward - (fees_entry + fees_exit_target);

    if net_risk <= 0.0 {
        return Ok(0.0);
    }
    Ok((net_reward / net_risk).max(0.0))
}

/// [`rr_with_costs`] with venue costs taken from a [`CostConfig`]
pub fn rr_with_cost_config(
    entry: f64,
    stop: f64,
    target: f64,
    side: Side,
    costs: &CostConfig,
) -> Result<f64, LevelError> {
    rr_with_costs(
        entry,
        stop,
        target,
        side,
        costs.tick_size,
        costs.fees_bps,
        costs.slippage_ticks,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_tick_decimals() {
        assert_eq!(tick_decimals(0.01), 2);
        assert_eq!(tick_decimals(0.25), 2);
        assert_eq!(tick_decimals(0.1), 1);
        assert_eq!(tick_decimals(1.0), 0);
        assert_eq!(tick_decimals(5.0), 0);
        assert_eq!(tick_decimals(0.0001), 4);
    }

    #[test]
    fn test_round_to_tick() {
        assert_eq!(round_to_tick(3405.127, 0.25), Ok(3405.25));
        assert_eq!(round_to_tick(0.1 + 0.2, 0.1), Ok(0.3));
        assert_eq!(round_to_tick(7.3, 0.5), Ok(7.5));
        // ties go to the even step
        assert_eq!(round_to_tick(7.25, 0.5), Ok(7.0));
        assert_eq!(round_to_tick(1234.5, 1.0), Ok(1234.0));
        assert_eq!(round_to_tick(1235.5, 1.0), Ok(1236.0));
    }

    #[test]
    fn test_round_to_tick_idempotent() {
        let mut rng = StdRng::seed_from_u64(7);
        let ticks = [0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0, 0.0001];
        for _ in 0..2_000 {
            let price: f64 = rng.gen_range(0.0..100_000.0);
            let tick = ticks[rng.gen_range(0..ticks.len())];
            let once = round_to_tick(price, tick).unwrap();
            let twice = round_to_tick(once, tick).unwrap();
            assert_eq!(once, twice, "price {} tick {}", price, tick);
        }
    }

    #[test]
    fn test_round_to_tick_rejects_bad_tick() {
        assert_eq!(round_to_tick(100.0, 0.0), Err(LevelError::InvalidTick(0.0)));
        assert!(round_to_tick(100.0, -0.01).is_err());
        assert!(round_to_tick(100.0, f64::NAN).is_err());
    }

    #[test]
    fn test_rr_monotonic_in_target() {
        let rr_4500 = rr_with_costs(4405.0, 4260.0, 4500.0, Side::Long, 0.01, 5.0, 1).unwrap();
        let rr_4600 = rr_with_costs(4405.0, 4260.0, 4600.0, Side::Long, 0.01, 5.0, 1).unwrap();
        assert!(rr_4500 > 0.0);
        assert!(rr_4600 > rr_4500);
        assert!((rr_4500 - 0.606133141393678).abs() < 1e-9);
        assert!((rr_4600 - 1.2753552836410438).abs() < 1e-9);
    }

    #[test]
    fn test_rr_short_without_fees() {
        // entry 99, stop 111, target 81 after two 0.5 ticks of slippage
        let rr = rr_with_costs(100.0, 110.0, 80.0, Side::Short, 0.5, 0.0, 2).unwrap();
        assert!((rr - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_rr_zero_when_risk_not_positive() {
        assert_eq!(rr_with_costs(100.0, 100.0, 110.0, Side::Long, 0.01, 0.0, 0), Ok(0.0));
        assert_eq!(rr_with_costs(100.0, 101.0, 110.0, Side::Long, 0.01, 0.0, 0), Ok(0.0));
        assert_eq!(rr_with_costs(100.0, 99.0, 90.0, Side::Short, 0.01, 0.0, 0), Ok(0.0));
    }

    #[test]
    fn test_rr_never_negative() {
        // target inside the cost band: gross reward is eaten by fees
        assert_eq!(rr_with_costs(100.0, 90.0, 100.01, Side::Long, 0.01, 5.0, 1), Ok(0.0));
        // target on the wrong side of entry
        assert_eq!(rr_with_costs(100.0, 110.0, 105.0, Side::Short, 0.01, 0.0, 0), Ok(0.0));

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..2_000 {
            let entry: f64 = rng.gen_range(10.0..10_000.0);
            let stop = entry + rng.gen_range(-100.0..100.0);
            let target = entry + rng.gen_range(-300.0..300.0);
            let fees = rng.gen_range(0.0..10.0);
            let slip = rng.gen_range(0..3);
            let side = if rng.gen_bool(0.5) { Side::Long } else { Side::Short };

            let rr = rr_with_costs(entry, stop, target, side, 0.01, fees, slip).unwrap();
            assert!(rr >= 0.0 && rr.is_finite());
        }
    }

    #[test]
    fn test_rr_argument_validation() {
        assert_eq!(
            rr_with_costs(100.0, 90.0, 120.0, Side::Long, 0.0, 5.0, 1),
            Err(LevelError::InvalidTick(0.0))
        );
        assert_eq!(
            rr_with_costs(100.0, 90.0, 120.0, Side::Long, 0.01, -1.0, 1),
            Err(LevelError::NegativeFees(-1.0))
        );
        assert_eq!(
            rr_with_costs(100.0, 90.0, 120.0, Side::Long, 0.01, 5.0, -1),
            Err(LevelError::NegativeSlippage(-1))
        );
    }

    #[test]
    fn test_rr_with_cost_config() {
        let costs = CostConfig::default();
        let direct = rr_with_costs(4405.0, 4260.0, 4500.0, Side::Long, 0.01, 5.0, 1).unwrap();
        assert_eq!(rr_with_cost_config(4405.0, 4260.0, 4500.0, Side::Long, &costs), Ok(direct));

        let frictionless = CostConfig::frictionless(1.0);
        assert_eq!(rr_with_cost_config(100.0, 90.0, 120.0, Side::Long, &frictionless), Ok(2.0));
    }
}
