//! Volume spike levels

use super::bars::Bar;
use super::levels::{LevelSource, RawLevel, MAX_STRENGTH};

/// Emit one level at the bar midpoint for every bar whose volume exceeds
/// `threshold` times the window's mean volume.
///
/// Strength is the whole multiple of mean volume, capped at 5. Repeated
/// prices are left for clustering to merge.
pub fn find_volume_levels(bars: &[Bar], threshold: f64) -> Vec<RawLevel> {
    if bars.is_empty() {
        return Vec::new();
    }

    let mean_volume = bars.iter().map(|b| b.volume).sum::<f64>() / bars.len() as f64;
    if mean_volume <= 0.0 {
        return Vec::new();
    }

    bars.iter()
        .filter(|b| b.volume > mean_volume * threshold)
        .map(|b| {
            let multiple = (b.volume / mean_volume).floor().min(MAX_STRENGTH as f64) as u8;
            RawLevel::new(b.mid(), multiple, LevelSource::Volume, 1)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_bar;

    #[test]
    fn test_spike_bar_becomes_level() {
        let mut bars: Vec<Bar> = (0..10).map(|i| test_bar(i, 101.0, 99.0, 100.0, 100.0)).collect();
        bars[4] = test_bar(4, 110.0, 106.0, 108.0, 400.0);

        // mean = (9 * 100 + 400) / 10 = 130; 400 / 130 = 3.07
        let levels = find_volume_levels(&bars, 1.5);
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].price, 108.0);
        assert_eq!(levels[0].strength, 3);
        assert_eq!(levels[0].touches, 1);
        assert_eq!(levels[0].source, LevelSource::Volume);
    }

    #[test]
    fn test_strength_capped_at_five() {
        let mut bars: Vec<Bar> = (0..20).map(|i| test_bar(i, 11.0, 9.0, 10.0, 1.0)).collect();
        bars[10] = test_bar(10, 12.0, 10.0, 11.0, 500.0);
        let levels = find_volume_levels(&bars, 1.5);
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].strength, 5);
    }

    #[test]
    fn test_flat_volume_has_no_spikes() {
        let bars: Vec<Bar> = (0..10).map(|i| test_bar(i, 11.0, 9.0, 10.0, 50.0)).collect();
        assert!(find_volume_levels(&bars, 1.5).is_empty());
    }

    #[test]
    fn test_zero_volume_and_empty() {
        let bars: Vec<Bar> = (0..5).map(|i| test_bar(i, 11.0, 9.0, 10.0, 0.0)).collect();
        assert!(find_volume_levels(&bars, 1.5).is_empty());
        assert!(find_volume_levels(&[], 1.5).is_empty());
    }
}
