/// Incremental RSI using Wilder's smoothing
///
/// The first value is produced after `period` price changes (`period + 1`
/// prices) from the simple average of those changes. Later values apply
/// `avg = avg * (period - 1) / period + x / period`.
#[derive(Debug, Clone)]
pub struct RsiState {
    period: usize,
    prev_price: Option<f64>,
    changes: usize,
    avg_gain: f64,
    avg_loss: f64,
}

impl RsiState {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            prev_price: None,
            changes: 0,
            avg_gain: 0.0,
            avg_loss: 0.0,
        }
    }

    /// Feed the next price, returning the RSI once warmed up
    pub fn update(&mut self, price: f64) -> Option<f64> {
        let prev = self.prev_price.replace(price)?;
        let delta = price - prev;
        let gain = delta.max(0.0);
        let loss = (-delta).max(0.0);
        let period = self.period as f64;

        self.changes += 1;
        if self.changes <= self.period {
            self.avg_gain += gain / period;
            self.avg_loss += loss / period;
            if self.changes < self.period {
                return None;
            }
        } else {
            self.avg_gain = (self.avg_gain * (period - 1.0) + gain) / period;
            self.avg_loss = (self.avg_loss * (period - 1.0) + loss) / period;
        }

        Some(self.value())
    }

    fn value(&self) -> f64 {
        if self.avg_loss == 0.0 {
            if self.avg_gain == 0.0 {
                50.0
            } else {
                100.0
            }
        } else {
            let rs = self.avg_gain / self.avg_loss;
            100.0 - (100.0 / (1.0 + rs))
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.period);
    }
}

/// Calculate RSI using Wilder's Smoothing
///
/// # Arguments
/// * `prices` - Slice of closing prices
/// * `period` - RSI period
///
/// # Returns
/// Vector aligned with `prices`, None for the first `period` values
pub fn calculate_rsi(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; prices.len()];
    }
    let mut state = RsiState::new(period);
    prices.iter().map(|&p| state.update(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi_basic() {
        let prices = vec![44.0, 44.25, 44.5, 43.75, 44.5, 44.25, 44.0, 43.5, 44.25, 44.5];
        let rsi = calculate_rsi(&prices, 2);

        assert_eq!(rsi.len(), prices.len());
        assert!(rsi[0].is_none());
        assert!(rsi[1].is_none());
        for val in rsi.iter().flatten() {
            assert!(*val >= 0.0 && *val <= 100.0);
        }
    }

    #[test]
    fn test_rsi_all_gains() {
        let prices = vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0];
        let rsi = calculate_rsi(&prices, 2);

        assert_eq!(rsi[rsi.len() - 1], Some(100.0));
    }

    #[test]
    fn test_rsi_all_losses() {
        let prices = vec![15.0, 14.0, 13.0, 12.0, 11.0, 10.0];
        let rsi = calculate_rsi(&prices, 2);

        assert_eq!(rsi[rsi.len() - 1], Some(0.0));
    }

    #[test]
    fn test_rsi_flat_is_neutral() {
        let rsi = calculate_rsi(&[5.0; 6], 3);
        assert_eq!(rsi[5], Some(50.0));
    }

    #[test]
    fn test_rsi_first_value_uses_simple_average() {
        // Changes: +2, -1 -> avg_gain 1.0, avg_loss 0.5, rs 2
        let rsi = calculate_rsi(&[10.0, 12.0, 11.0], 2);
        let expected = 100.0 - 100.0 / 3.0;
        assert!((rsi[2].unwrap() - expected).abs() < 1e-12);
    }
}
