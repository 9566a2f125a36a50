//! Error types for level detection and trade economics

use thiserror::Error;

/// All errors generated by the `levelplan` library.
///
/// Every variant is an invalid argument: it is raised before any computation
/// starts, so callers never see a partially computed result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LevelError {
    #[error("tick must be > 0, got {0}")]
    InvalidTick(f64),

    #[error("fees_bps must be >= 0, got {0}")]
    NegativeFees(f64),

    #[error("slippage_ticks must be >= 0, got {0}")]
    NegativeSlippage(i64),

    #[error("series must contain at least 1 value")]
    EmptySeries,

    #[error("period must be > 0")]
    InvalidPeriod,

    #[error("bar window is empty")]
    EmptyWindow,
}

impl LevelError {
    /// Determine if the error was caused by a caller supplied argument.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            LevelError::InvalidTick(_)
                | LevelError::NegativeFees(_)
                | LevelError::NegativeSlippage(_)
                | LevelError::EmptySeries
                | LevelError::InvalidPeriod
                | LevelError::EmptyWindow
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            LevelError::InvalidTick(0.0).to_string(),
            "tick must be > 0, got 0"
        );
        assert_eq!(
            LevelError::NegativeSlippage(-2).to_string(),
            "slippage_ticks must be >= 0, got -2"
        );
        assert!(LevelError::EmptySeries.is_invalid_argument());
    }
}
