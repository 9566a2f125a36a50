//! Support/resistance fusion
//!
//! Pools the four detectors, merges nearby levels, then keeps the nearest
//! supports below and resistances above the current price.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::bars::Bar;
use super::fibonacci::{calculate_fibonacci_levels, recent_range};
use super::levels::{cluster_price_levels, LevelKind, LevelSource, PriceLevel};
use super::psychological::find_psychological_levels;
use super::swing::find_swing_points;
use super::volume::find_volume_levels;
use crate::config::LevelConfig;
use crate::error::LevelError;

/// A selected level with its distance from current price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportedLevel {
    pub price: f64,
    pub kind: LevelKind,
    pub strength: u8,
    pub source: LevelSource,
    pub touches: u32,
    /// |price - current| / current * 100
    pub distance_pct: f64,
}

impl ReportedLevel {
    fn from_level(level: &PriceLevel, current_price: f64) -> Self {
        Self {
            price: level.price,
            kind: level.kind,
            strength: level.strength,
            source: level.source,
            touches: level.touches,
            distance_pct: (level.price - current_price).abs() / current_price * 100.0,
        }
    }
}

/// Ranked support and resistance around the current price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportResistance {
    pub current_price: f64,
    /// Highest price first
    pub supports: Vec<ReportedLevel>,
    /// Lowest price first
    pub resistances: Vec<ReportedLevel>,
}

impl SupportResistance {
    pub fn nearest_support(&self) -> Option<&ReportedLevel> {
        self.supports.first()
    }

    pub fn nearest_resistance(&self) -> Option<&ReportedLevel> {
        self.resistances.first()
    }
}

/// Run every detector and type its output.
///
/// Swing highs/lows keep their fixed kinds; volume, psychological and
/// Fibonacci candidates are classified against `current_price`. A detector
/// without enough bars simply contributes nothing.
pub fn collect_levels(bars: &[Bar], current_price: f64, config: &LevelConfig) -> Vec<PriceLevel> {
    let mut levels = find_swing_points(bars, config.pivot_window).to_levels();
    let swing_count = levels.len();

    let volume = find_volume_levels(bars, config.volume_threshold);
    let psychological =
        find_psychological_levels(current_price, &config.psychological_levels, config.price_range);
    let fibonacci = recent_range(bars, config.fib_lookback)
        .map(|range| calculate_fibonacci_levels(range, &config.fib_ratios))
        .unwrap_or_default();

    debug!(
        "Raw levels: {} swing, {} volume, {} psychological, {} fibonacci",
        swing_count,
        volume.len(),
        psychological.len(),
        fibonacci.len()
    );

    levels.extend(
        volume
            .into_iter()
            .chain(psychological)
            .chain(fibonacci)
            .map(|raw| raw.classify(current_price)),
    );
    levels
}

/// Split merged levels by kind, order them nearest-first and keep `max_levels` per side
pub fn select_levels(merged: &[PriceLevel], current_price: f64, max_levels: usize) -> SupportResistance {
    let mut supports: Vec<&PriceLevel> = merged.iter().filter(|l| l.kind == LevelKind::Support).collect();
    let mut resistances: Vec<&PriceLevel> =
        merged.iter().filter(|l| l.kind == LevelKind::Resistance).collect();

    supports.sort_by(|a, b| b.price.total_cmp(&a.price));
    resistances.sort_by(|a, b| a.price.total_cmp(&b.price));

    let report = |levels: Vec<&PriceLevel>| -> Vec<ReportedLevel> {
        levels
            .into_iter()
            .take(max_levels)
            .map(|l| ReportedLevel::from_level(l, current_price))
            .collect()
    };

    SupportResistance {
        current_price,
        supports: report(supports),
        resistances: report(resistances),
    }
}

/// Full level pipeline over a bar window; current price is the last close
pub fn calculate_support_resistance(
    bars: &[Bar],
    config: &LevelConfig,
) -> Result<SupportResistance, LevelError> {
    let current_price = bars.last().ok_or(LevelError::EmptyWindow)?.close;

    let pooled = collect_levels(bars, current_price, config);
    let merged = cluster_price_levels(&pooled, config.cluster_distance);
    let selected = select_levels(&merged, current_price, config.max_levels);

    debug!(
        "Selected {} supports, {} resistances around {:.2}",
        selected.supports.len(),
        selected.resistances.len(),
        current_price
    );

    Ok(selected)
}
