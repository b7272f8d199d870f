use common::{Bar, Result, RsiConfig, Signal, SignalType};

use super::SignalSource;
use crate::indicators::RsiState;

/// RSI mean reversion: buy when RSI drops into oversold, sell when it
/// rises into overbought
#[derive(Debug, Clone)]
pub struct RsiReversionStrategy {
    config: RsiConfig,
    rsi: RsiState,
    prev_rsi: Option<f64>,
    seen: usize,
}

impl RsiReversionStrategy {
    pub fn new(config: RsiConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            rsi: RsiState::new(config.period),
            config,
            prev_rsi: None,
            seen: 0,
        })
    }

    pub fn config(&self) -> &RsiConfig {
        &self.config
    }

    fn observe(&mut self, close: f64) -> SignalType {
        self.seen += 1;
        let Some(rsi) = self.rsi.update(close) else {
            return SignalType::Hold;
        };
        let signal = match self.prev_rsi {
            Some(prev) if prev >= self.config.oversold && rsi < self.config.oversold => {
                SignalType::Buy
            }
            Some(prev) if prev <= self.config.overbought && rsi > self.config.overbought => {
                SignalType::Sell
            }
            _ => SignalType::Hold,
        };
        self.prev_rsi = Some(rsi);
        signal
    }
}

impl SignalSource for RsiReversionStrategy {
    fn name(&self) -> &str {
        "rsi_reversion"
    }

    fn warmup_len(&self) -> usize {
        self.config.period + 1
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
        self.rsi.reset();
        self.prev_rsi = None;
        self.seen = 0;
    }
}
