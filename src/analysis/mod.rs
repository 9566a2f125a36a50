//! Analysis - level detection and trade economics
//!
//! This module contains the core components:
//! - Bar windows and CSV/zstd ingestion
//! - Swing, volume, psychological and Fibonacci level detectors
//! - Level clustering and support/resistance selection
//! - ATR and EMA
//! - Trade plan builder
//! - Tick rounding and risk-reward net of costs
//! - Cost-aware structured plan

pub mod bars;
pub mod swing;
pub mod volume;
pub mod psychological;
pub mod fibonacci;
pub mod levels;
pub mod support_resistance;
pub mod indicators;
pub mod plan;
pub mod costs;
pub mod structured;

// Re-export commonly used types
pub use bars::{load_bars, read_bars, Bar};
pub use costs::{round_to_tick, rr_with_cost_config, rr_with_costs, Side};
pub use indicators::{average_true_range, ema};
pub use levels::{cluster_price_levels, LevelKind, LevelSource, PriceLevel, RawLevel};
pub use plan::{build_trade_setup, calculate_entry_exit_points, Direction, TradePlan, TradeSetup, WatchPlan};
pub use structured::{build_structured_plan, AutoAdjustment, StructuredPlan};
pub use support_resistance::{calculate_support_resistance, ReportedLevel, SupportResistance};

#[cfg(test)]
pub(crate) fn test_bar(idx: usize, high: f64, low: f64, close: f64, volume: f64) -> Bar {
    use chrono::{Duration, TimeZone, Utc};

    Bar {
        timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::hours(idx as i64),
        open: close,
        high,
        low,
        close,
        volume,
    }
}
