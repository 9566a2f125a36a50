//! Configuration for level detection and trade economics

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::analysis::LevelSource;

/// Round-number granularities scanned around the current price
pub const DEFAULT_PSYCHOLOGICAL_LEVELS: [f64; 6] = [50.0, 100.0, 150.0, 200.0, 250.0, 300.0];

/// Granularities that earn the stronger psychological rating.
/// 500 is not in the default granularity set, so that entry never fires
/// unless a caller configures it.
pub const STRONG_ROUND_NUMBERS: [f64; 3] = [100.0, 200.0, 500.0];

/// Fibonacci ratios for retracements and extensions
pub const DEFAULT_FIB_RATIOS: [f64; 5] = [0.236, 0.382, 0.5, 0.618, 0.786];

/// Retracement ratios rated above the rest
pub const KEY_RETRACEMENTS: [f64; 2] = [0.382, 0.618];

/// Dominant-kind priority when merging a cluster (higher wins)
pub const SOURCE_PRIORITY: [(LevelSource, u8); 5] = [
    (LevelSource::Fibonacci, 4),
    (LevelSource::Volume, 3),
    (LevelSource::Swing, 2),
    (LevelSource::Psychological, 1),
    (LevelSource::Cluster, 0),
];

/// Look up the merge priority of a level source
pub fn source_priority(source: LevelSource) -> u8 {
    SOURCE_PRIORITY
        .iter()
        .find(|(s, _)| *s == source)
        .map(|(_, p)| *p)
        .unwrap_or(0)
}

/// Tunable thresholds for level detection and plan construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Swing point half-window in bars
    pub pivot_window: usize,

    /// Volume spike multiple of mean volume
    pub volume_threshold: f64,

    /// Max price distance between chained cluster members
    pub cluster_distance: f64,

    /// Round-number granularities
    pub psychological_levels: Vec<f64>,

    /// Max distance of a psychological level from current price
    pub price_range: f64,

    /// ATR lookback in bars
    pub atr_period: usize,

    /// Fibonacci ratios
    pub fib_ratios: Vec<f64>,

    /// Bars used for the Fibonacci high/low range
    pub fib_lookback: usize,

    /// Levels kept on each side of price
    pub max_levels: usize,

    /// EMA period for the magnet level
    pub ema_period: usize,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            pivot_window: 5,
            volume_threshold: 1.5,
            cluster_distance: 10.0,
            psychological_levels: DEFAULT_PSYCHOLOGICAL_LEVELS.to_vec(),
            price_range: 500.0,
            atr_period: 14,
            fib_ratios: DEFAULT_FIB_RATIOS.to_vec(),
            fib_lookback: 20,
            max_levels: 5,
            ema_period: 20,
        }
    }
}

/// Venue trading costs applied to risk-reward evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    /// Minimum price increment
    pub tick_size: f64,

    /// Taker fee in basis points, charged on entry and exit notional
    pub fees_bps: f64,

    /// Adverse slippage in ticks on every fill
    pub slippage_ticks: i64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            tick_size: 0.01,   // USDT-margined perp tick
            fees_bps: 5.0,     // Taker fee
            slippage_ticks: 1,
        }
    }
}

impl CostConfig {
    /// Frictionless costs on a given tick grid
    pub fn frictionless(tick_size: f64) -> Self {
        Self {
            tick_size,
            fees_bps: 0.0,
            slippage_ticks: 0,
        }
    }
}

/// Top-level configuration file layout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub levels: LevelConfig,
    pub costs: CostConfig,
}

impl AppConfig {
    /// Load configuration from a JSON file; missing fields keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_priority_order() {
        assert!(source_priority(LevelSource::Fibonacci) > source_priority(LevelSource::Volume));
        assert!(source_priority(LevelSource::Volume) > source_priority(LevelSource::Swing));
        assert!(source_priority(LevelSource::Swing) > source_priority(LevelSource::Psychological));
        assert_eq!(source_priority(LevelSource::Cluster), 0);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"levels": {"cluster_distance": 2.5}, "costs": {"tick_size": 0.25}}"#)
                .unwrap();
        assert_eq!(config.levels.cluster_distance, 2.5);
        assert_eq!(config.levels.pivot_window, 5);
        assert_eq!(config.costs.tick_size, 0.25);
        assert_eq!(config.costs.fees_bps, 5.0);
        assert_eq!(config.costs.slippage_ticks, 1);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"levels": {"atr_period": 7}}"#).unwrap();

        let config = AppConfig::from_json_file(&path).unwrap();
        assert_eq!(config.levels.atr_period, 7);
        assert_eq!(config.costs, CostConfig::default());

        assert!(AppConfig::from_json_file(&dir.path().join("missing.json")).is_err());
    }
}
