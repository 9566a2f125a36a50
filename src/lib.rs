// Library crate - level detection and cost-aware trade plans

pub mod analysis;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use analysis::*;
pub use config::{AppConfig, CostConfig, LevelConfig};
pub use error::LevelError;
