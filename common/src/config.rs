use serde::{Deserialize, Serialize};

use crate::error::{BacktestError, Result};
use crate::timeframe::Timeframe;

/// Upper bound for commission and slippage rates
pub const MAX_COST_RATE: f64 = 0.01;

fn check_position_size(position_size: f64) -> Result<()> {
    if !(position_size > 0.0 && position_size <= 1.0) {
        return Err(BacktestError::strategy_config(
            "position_size",
            format!("must be within (0, 1], got {}", position_size),
        ));
    }
    Ok(())
}

/// Moving average cross strategy parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub fast_period: usize,
    pub slow_period: usize,
    /// Fraction of available capital committed per entry
    pub position_size: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            fast_period: 5,
            slow_period: 20,
            position_size: 0.5,
        }
    }
}

impl StrategyConfig {
    pub fn new(fast_period: usize, slow_period: usize, position_size: f64) -> Self {
        Self {
            fast_period,
            slow_period,
            position_size,
        }
    }

    pub fn with_periods(mut self, fast_period: usize, slow_period: usize) -> Self {
        self.fast_period = fast_period;
        self.slow_period = slow_period;
        self
    }

    pub fn with_position_size(mut self, position_size: f64) -> Self {
        self.position_size = position_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.fast_period < 1 {
            return Err(BacktestError::strategy_config(
                "fast_period",
                "must be at least 1",
            ));
        }
        if self.slow_period < 1 {
            return Err(BacktestError::strategy_config(
                "slow_period",
                "must be at least 1",
            ));
        }
        if self.fast_period >= self.slow_period {
            return Err(BacktestError::strategy_config(
                "fast_period",
                format!(
                    "must be less than slow_period ({} >= {})",
                    self.fast_period, self.slow_period
                ),
            ));
        }
        check_position_size(self.position_size)
    }
}

/// RSI mean reversion strategy parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsiConfig {
    pub period: usize,
    pub oversold: f64,
    pub overbought: f64,
    pub position_size: f64,
}

impl Default for RsiConfig {
    fn default() -> Self {
        Self {
            period: 14,
            oversold: 30.0,
            overbought: 70.0,
            position_size: 0.5,
        }
    }
}

impl RsiConfig {
    pub fn with_period(mut self, period: usize) -> Self {
        self.period = period;
        self
    }

    pub fn with_thresholds(mut self, oversold: f64, overbought: f64) -> Self {
        self.oversold = oversold;
        self.overbought = overbought;
        self
    }

    pub fn with_position_size(mut self, position_size: f64) -> Self {
        self.position_size = position_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.period < 1 {
            return Err(BacktestError::strategy_config("period", "must be at least 1"));
        }
        if !(self.oversold > 0.0 && self.oversold < self.overbought && self.overbought < 100.0) {
            return Err(BacktestError::strategy_config(
                "oversold",
                format!(
                    "thresholds must satisfy 0 < oversold < overbought < 100, got {} / {}",
                    self.oversold, self.overbought
                ),
            ));
        }
        check_position_size(self.position_size)
    }
}

/// Simulation capital and trading costs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub commission_rate: f64,
    pub slippage_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: 10000.0,
            commission_rate: 0.001,
            slippage_rate: 0.001,
        }
    }
}

impl BacktestConfig {
    pub fn with_capital(mut self, capital: f64) -> Self {
        self.initial_capital = capital;
        self
    }

    pub fn with_commission(mut self, commission_rate: f64) -> Self {
        self.commission_rate = commission_rate;
        self
    }

    pub fn with_slippage(mut self, slippage_rate: f64) -> Self {
        self.slippage_rate = slippage_rate;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(BacktestError::backtest_config(
                "initial_capital",
                format!("must be positive, got {}", self.initial_capital),
            ));
        }
        for (param, rate) in [
            ("commission_rate", self.commission_rate),
            ("slippage_rate", self.slippage_rate),
        ] {
            if !(0.0..=MAX_COST_RATE).contains(&rate) {
                return Err(BacktestError::backtest_config(
                    param,
                    format!("must be within [0, {}], got {}", MAX_COST_RATE, rate),
                ));
            }
        }
        Ok(())
    }
}

/// Bar cleaning thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanerConfig {
    /// Minimum number of bars that must survive cleaning
    pub min_bars: usize,
    /// Explicit gap threshold; inferred from the median interval when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_gap_ms: Option<i64>,
    /// Multiple of the median interval treated as a gap when `max_gap_ms` is unset
    pub gap_tolerance: f64,
    /// Relative close-to-close move flagged as suspicious
    pub price_jump_threshold: f64,
    pub volume_spike_multiplier: f64,
    pub volume_lookback: usize,
    pub min_volume_history: usize,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            min_bars: 1,
            max_gap_ms: None,
            gap_tolerance: 1.5,
            price_jump_threshold: 0.5,
            volume_spike_multiplier: 10.0,
            volume_lookback: 100,
            min_volume_history: 10,
        }
    }
}

impl CleanerConfig {
    /// Treat anything longer than one bar interval as a gap
    pub fn for_timeframe(timeframe: Timeframe) -> Self {
        Self {
            max_gap_ms: Some(timeframe.as_millis()),
            ..Default::default()
        }
    }

    pub fn with_min_bars(mut self, min_bars: usize) -> Self {
        self.min_bars = min_bars;
        self
    }

    pub fn with_max_gap_ms(mut self, max_gap_ms: i64) -> Self {
        self.max_gap_ms = Some(max_gap_ms);
        self
    }
}
