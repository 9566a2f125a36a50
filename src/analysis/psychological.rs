//! Round-number (psychological) levels

use super::levels::{LevelSource, RawLevel};
use crate::config::STRONG_ROUND_NUMBERS;

/// Multiples of each granularity scanned around the current price
const MULTIPLIERS: [i32; 5] = [-2, -1, 0, 1, 2];

/// Emit round-number candidates near `current_price`.
///
/// For each granularity `g` the grid is anchored at `floor(price / g) * g`
/// and stepped by `g`. Candidates must be positive and within `price_range`
/// of current price. Granularities listed in [`STRONG_ROUND_NUMBERS`] rate 3,
/// the rest 2. The same price may appear once per granularity.
pub fn find_psychological_levels(
    current_price: f64,
    granularities: &[f64],
    price_range: f64,
) -> Vec<RawLevel> {
    let mut levels = Vec::new();

    for &g in granularities.iter().filter(|g| **g > 0.0) {
        let base = (current_price / g).floor() * g;
        let strength = if STRONG_ROUND_NUMBERS.contains(&g) { 3 } else { 2 };

        for k in MULTIPLIERS {
            let price = base + k as f64 * g;
            if price > 0.0 && (price - current_price).abs() <= price_range {
                levels.push(RawLevel::new(price, strength, LevelSource::Psychological, 0));
            }
        }
    }

    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PSYCHOLOGICAL_LEVELS;

    fn prices(levels: &[RawLevel]) -> Vec<f64> {
        levels.iter().map(|l| l.price).collect()
    }

    #[test]
    fn test_grid_around_price() {
        let levels = find_psychological_levels(3420.0, &[100.0], 500.0);
        assert_eq!(prices(&levels), vec![3200.0, 3300.0, 3400.0, 3500.0, 3600.0]);
        assert!(levels.iter().all(|l| l.strength == 3));
    }

    #[test]
    fn test_range_cutoff() {
        let levels = find_psychological_levels(3420.0, &[300.0], 500.0);
        // base 3300: 2700 is 720 away and is dropped
        assert_eq!(prices(&levels), vec![3000.0, 3300.0, 3600.0, 3900.0]);
        assert!(levels.iter().all(|l| l.strength == 2));
    }

    #[test]
    fn test_non_positive_candidates_dropped() {
        let levels = find_psychological_levels(120.0, &[100.0], 500.0);
        assert_eq!(prices(&levels), vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn test_default_granularities_strength() {
        let levels = find_psychological_levels(3420.0, &DEFAULT_PSYCHOLOGICAL_LEVELS, 500.0);
        for level in &levels {
            assert!(level.strength == 2 || level.strength == 3);
        }
        // 3400 appears for g = 50, 100 and 200
        assert_eq!(levels.iter().filter(|l| l.price == 3400.0).count(), 3);
    }

    #[test]
    fn test_configured_500_is_strong() {
        let levels = find_psychological_levels(3420.0, &[500.0], 500.0);
        assert_eq!(prices(&levels), vec![3000.0, 3500.0]);
        assert!(levels.iter().all(|l| l.strength == 3));
    }
}
