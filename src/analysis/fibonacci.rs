//! Fibonacci retracement and extension levels

use serde::{Deserialize, Serialize};

use super::bars::Bar;
use super::levels::{LevelSource, RawLevel};
use crate::config::KEY_RETRACEMENTS;

/// Strength of every extension level
const EXTENSION_STRENGTH: u8 = 3;

/// High/low range of recent bars
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingRange {
    pub high: f64,
    pub low: f64,
}

impl SwingRange {
    pub fn height(&self) -> f64 {
        self.high - self.low
    }
}

/// Max high and min low over the last `lookback` bars.
///
/// Returns `None` unless the window holds more than `lookback` bars.
pub fn recent_range(bars: &[Bar], lookback: usize) -> Option<SwingRange> {
    if lookback == 0 || bars.len() <= lookback {
        return None;
    }
    let recent = &bars[bars.len() - lookback..];
    Some(SwingRange {
        high: recent.iter().map(|b| b.high).fold(f64::MIN, f64::max),
        low: recent.iter().map(|b| b.low).fold(f64::MAX, f64::min),
    })
}

/// Retracements (`high - range * r`) and extensions (`high + range * r`) for
/// each ratio, in ratio order with the retracement first.
pub fn calculate_fibonacci_levels(range: SwingRange, ratios: &[f64]) -> Vec<RawLevel> {
    let height = range.height();

    ratios
        .iter()
        .flat_map(|&ratio| {
            let retracement_strength = if KEY_RETRACEMENTS.contains(&ratio) { 4 } else { 3 };
            [
                RawLevel::new(range.high - height * ratio, retracement_strength, LevelSource::Fibonacci, 0),
                RawLevel::new(range.high + height * ratio, EXTENSION_STRENGTH, LevelSource::Fibonacci, 0),
            ]
        })
        .collect()
}
