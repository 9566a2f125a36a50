//! Swing point detection on a symmetric bar window

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bars::Bar;
use super::levels::{LevelKind, LevelSource, PriceLevel, RawLevel};

/// Strength assigned to every swing level
const SWING_STRENGTH: u8 = 3;

/// A local extreme in high or low
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    pub index: usize,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
    pub volume: f64,
}

/// Swing highs and lows found in one window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwingPoints {
    pub highs: Vec<SwingPoint>,
    pub lows: Vec<SwingPoint>,
}

impl SwingPoints {
    /// Highs become resistance and lows become support, whatever the current price
    pub fn to_levels(&self) -> Vec<PriceLevel> {
        let highs = self.highs.iter().map(|p| {
            RawLevel::new(p.price, SWING_STRENGTH, LevelSource::Swing, 1).with_kind(LevelKind::Resistance)
        });
        let lows = self.lows.iter().map(|p| {
            RawLevel::new(p.price, SWING_STRENGTH, LevelSource::Swing, 1).with_kind(LevelKind::Support)
        });
        highs.chain(lows).collect()
    }
}

/// Find swing highs/lows with half-window `window`.
///
/// Bar `i` is a swing high when no bar within `window` on either side has a
/// strictly greater high (lows mirror this). Equal neighbours still qualify,
/// so plateaus yield several adjacent points. Bars closer than `window` to
/// either edge are never evaluated.
pub fn find_swing_points(bars: &[Bar], window: usize) -> SwingPoints {
    let mut points = SwingPoints::default();
    if bars.len() <= 2 * window {
        return points;
    }

    for i in window..bars.len() - window {
        let bar = &bars[i];
        let neighbours = (1..=window).flat_map(|j| [i - j, i + j]);

        if neighbours.clone().all(|k| bar.high >= bars[k].high) {
            points.highs.push(SwingPoint {
                index: i,
                price: bar.high,
                timestamp: bar.timestamp,
                volume: bar.volume,
            });
        }

        if neighbours.clone().all(|k| bar.low <= bars[k].low) {
            points.lows.push(SwingPoint {
                index: i,
                price: bar.low,
                timestamp: bar.timestamp,
                volume: bar.volume,
            });
        }
    }

    points
}
