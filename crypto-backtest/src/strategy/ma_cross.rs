use std::cmp::Ordering;

use common::{Bar, Result, Signal, SignalType, StrategyConfig};

use super::SignalSource;
use crate::indicators::RollingWindow;

/// Relative tolerance under which the two averages count as equal.
/// Incremental sums pick up rounding noise on flat prices.
const CROSS_EPSILON: f64 = 1e-9;

/// Moving average crossover strategy
///
/// Emits BUY when the fast average moves from at-or-below the slow average
/// to above it, and SELL on the opposite move. The first bar with both
/// averages available only records the baseline.
#[derive(Debug, Clone)]
pub struct MovingAverageCrossStrategy {
    config: StrategyConfig,
    fast: RollingWindow,
    slow: RollingWindow,
    prev_relation: Option<Ordering>,
    seen: usize,
}

impl MovingAverageCrossStrategy {
    pub fn new(config: StrategyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            fast: RollingWindow::new(config.fast_period),
            slow: RollingWindow::new(config.slow_period),
            config,
            prev_relation: None,
            seen: 0,
        })
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Current (fast, slow) averages once both windows are full
    pub fn averages(&self) -> Option<(f64, f64)> {
        Some((self.fast.mean()?, self.slow.mean()?))
    }

    fn observe(&mut self, close: f64) -> SignalType {
        self.fast.push(close);
        self.slow.push(close);
        self.seen += 1;

        let Some((fast, slow)) = self.averages() else {
            return SignalType::Hold;
        };
        let relation = compare(fast, slow);
        let signal = match self.prev_relation {
            Some(prev) if prev != Ordering::Greater && relation == Ordering::Greater => {
                SignalType::Buy
            }
            Some(prev) if prev != Ordering::Less && relation == Ordering::Less => SignalType::Sell,
            _ => SignalType::Hold,
        };
        self.prev_relation = Some(relation);
        signal
    }
}

fn compare(fast: f64, slow: f64) -> Ordering {
    let tolerance = CROSS_EPSILON * fast.abs().max(slow.abs()).max(1.0);
    if fast - slow > tolerance {
        Ordering::Greater
    } else if slow - fast > tolerance {
        Ordering::Less
    } else {
        Ordering::Equal
    }
}

impl SignalSource for MovingAverageCrossStrategy {
    fn name(&self) -> &str {
        "ma_cross"
    }

    fn warmup_len(&self) -> usize {
        self.config.slow_period
    }

    fn position_size(&self) -> f64 {
        self.config.position_size
    }

    fn signal_for(&mut self, window: &[Bar]) -> Signal {
        let Some((current, history)) = window.split_last() else {
            self.reset();
            return Signal::hold(0);
        };
        if history.len() != self.seen {
            self.reset();
            for bar in history {
                self.observe(bar.close);
            }
        }
        Signal::new(current.timestamp, self.observe(current.close))
    }

    fn reset(&mut self) {
        self.fast.clear();
        self.slow.clear();
        self.prev_relation = None;
        self.seen = 0;
    }
}
