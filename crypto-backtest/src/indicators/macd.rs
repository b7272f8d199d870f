use super::ema::{calculate_ema, calculate_ema_sparse};

/// MACD line, signal line and histogram aligned with the input prices
#[derive(Debug, Clone, Default)]
pub struct Macd {
    /// Fast EMA minus slow EMA
    pub dif: Vec<Option<f64>>,
    /// EMA of `dif`
    pub dea: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

/// Calculate MACD (12/26/9 by convention)
pub fn calculate_macd(
    prices: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> Macd {
    let fast = calculate_ema(prices, fast_period);
    let slow = calculate_ema(prices, slow_period);

    let dif: Vec<Option<f64>> = fast
        .iter()
        .zip(&slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();
    let dea = calculate_ema_sparse(&dif, signal_period);
    let histogram = dif
        .iter()
        .zip(&dea)
        .map(|(d, e)| Some((*d)? - (*e)?))
        .collect();

    Macd {
        dif,
        dea,
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macd_alignment() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let macd = calculate_macd(&prices, 12, 26, 9);

        assert_eq!(macd.dif.len(), 60);
        assert!(macd.dif[24].is_none());
        assert!(macd.dif[25].is_some());
        // Signal needs 9 DIF values: first at 25 + 8
        assert!(macd.dea[32].is_none());
        assert!(macd.dea[33].is_some());
        assert!(macd.histogram[33].is_some());
    }

    #[test]
    fn test_macd_positive_in_uptrend() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 2.0).collect();
        let macd = calculate_macd(&prices, 12, 26, 9);

        for dif in macd.dif.iter().flatten() {
            assert!(*dif > 0.0);
        }
    }

    #[test]
    fn test_macd_short_series() {
        let macd = calculate_macd(&[1.0, 2.0, 3.0], 12, 26, 9);
        assert!(macd.dif.iter().all(|v| v.is_none()));
        assert!(macd.histogram.iter().all(|v| v.is_none()));
    }
}
