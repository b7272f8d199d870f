use thiserror::Error;

#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("Insufficient data: need at least {required} bars, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Invalid strategy config: {param} {reason}")]
    InvalidStrategyConfig { param: &'static str, reason: String },

    #[error("Invalid backtest config: {param} {reason}")]
    InvalidBacktestConfig { param: &'static str, reason: String },

    #[error("Insufficient cash: need ${required:.2}, have ${available:.2}")]
    InsufficientCash { required: f64, available: f64 },

    #[error("Position already open since {entry_timestamp}")]
    PositionAlreadyOpen { entry_timestamp: i64 },

    #[error("Collector error: {0}")]
    Collector(String),

    #[error("Data loading error: {0}")]
    DataLoad(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parse error: {0}")]
    Csv(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BacktestError {
    pub fn strategy_config(param: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidStrategyConfig {
            param,
            reason: reason.into(),
        }
    }

    pub fn backtest_config(param: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidBacktestConfig {
            param,
            reason: reason.into(),
        }
    }

    /// Only transport failures from the collector are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Collector(_))
    }
}

pub type Result<T> = std::result::Result<T, BacktestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(BacktestError::Collector("timeout".to_string()).is_retryable());
        assert!(!BacktestError::InsufficientData {
            required: 20,
            actual: 3
        }
        .is_retryable());
        assert!(!BacktestError::strategy_config("fast_period", "must be >= 1").is_retryable());
    }

    #[test]
    fn test_error_messages() {
        let err = BacktestError::backtest_config("commission_rate", "must be within [0, 0.01], got 0.5");
        assert_eq!(
            err.to_string(),
            "Invalid backtest config: commission_rate must be within [0, 0.01], got 0.5"
        );

        let err = BacktestError::InsufficientData {
            required: 20,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient data: need at least 20 bars, got 3"
        );
    }
}
