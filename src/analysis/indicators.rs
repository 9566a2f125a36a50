//! Trailing indicators: Average True Range and Exponential Moving Average

use super::bars::Bar;
use crate::error::LevelError;

/// True range per bar. The first bar has no previous close, so its range is
/// just `high - low`.
pub fn true_ranges(bars: &[Bar]) -> Vec<f64> {
    let mut ranges = Vec::with_capacity(bars.len());
    let mut prev_close: Option<f64> = None;

    for bar in bars {
        let tr = match prev_close {
            Some(pc) => (bar.high - bar.low)
                .max((bar.high - pc).abs())
                .max((bar.low - pc).abs()),
            None => bar.high - bar.low,
        };
        ranges.push(tr);
        prev_close = Some(bar.close);
    }

    ranges
}

/// Simple trailing mean of true range over the last `period` bars.
///
/// Shorter windows average whatever bars exist. Returns `None` for an empty
/// window or a zero period.
pub fn average_true_range(bars: &[Bar], period: usize) -> Option<f64> {
    if bars.is_empty() || period == 0 {
        return None;
    }

    let ranges = true_ranges(bars);
    let tail = &ranges[ranges.len().saturating_sub(period)..];
    Some(tail.iter().sum::<f64>() / tail.len() as f64)
}

/// Final value of the EMA seeded with the first element, `alpha = 2 / (period + 1)`.
///
/// The result is not rounded; callers round to tick themselves.
pub fn ema(values: &[f64], period: usize) -> Result<f64, LevelError> {
    if period == 0 {
        return Err(LevelError::InvalidPeriod);
    }
    let (first, rest) = values.split_first().ok_or(LevelError::EmptySeries)?;

    let alpha = 2.0 / (period as f64 + 1.0);
    // prev + alpha * (x - prev) == alpha * x + (1 - alpha) * prev, and stays
    // exact on a flat series
    Ok(rest.iter().fold(*first, |prev, x| prev + alpha * (x - prev)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_bar;

    #[test]
    fn test_true_range_uses_previous_close() {
        let bars = vec![
            test_bar(0, 102.0, 98.0, 100.0, 1.0),
            // gap up: |high - prev_close| = 10 beats high - low = 3
            test_bar(1, 110.0, 107.0, 108.0, 1.0),
            // gap down: |low - prev_close| = 8
            test_bar(2, 101.0, 100.0, 100.5, 1.0),
        ];
        assert_eq!(true_ranges(&bars), vec![4.0, 10.0, 8.0]);
    }

    #[test]
    fn test_atr_trailing_window() {
        let bars = vec![
            test_bar(0, 102.0, 98.0, 100.0, 1.0),
            test_bar(1, 110.0, 107.0, 108.0, 1.0),
            test_bar(2, 101.0, 100.0, 100.5, 1.0),
        ];
        assert_eq!(average_true_range(&bars, 2), Some(9.0));
        assert_eq!(average_true_range(&bars, 14), Some(22.0 / 3.0));
        assert_eq!(average_true_range(&[], 14), None);
        assert_eq!(average_true_range(&bars, 0), None);
    }

    #[test]
    fn test_ema_constant_series() {
        assert_eq!(ema(&[100.0; 20], 20), Ok(100.0));
    }

    #[test]
    fn test_ema_recurrence() {
        // alpha = 0.5 for period 3
        let value = ema(&[10.0, 20.0, 30.0], 3).unwrap();
        // 10 -> 15 -> 22.5
        assert!((value - 22.5).abs() < 1e-12);
        assert_eq!(ema(&[42.0], 20), Ok(42.0));
    }

    #[test]
    fn test_ema_invalid_arguments() {
        assert_eq!(ema(&[], 20), Err(LevelError::EmptySeries));
        assert_eq!(ema(&[1.0], 0), Err(LevelError::InvalidPeriod));
        assert!(ema(&[], 20).unwrap_err().is_invalid_argument());
    }
}
