/// Calculate Exponential Moving Average seeded with the SMA of the first `period` values
///
/// # Arguments
/// * `values` - Slice of input values
/// * `period` - EMA period
///
/// # Returns
/// Vector aligned with `values`, None until the seed is available
pub fn calculate_ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut ema = vec![None; n];
    if period == 0 || n < period {
        return ema;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut current = values[..period].iter().sum::<f64>() / period as f64;
    ema[period - 1] = Some(current);

    for i in period..n {
        current = alpha * values[i] + (1.0 - alpha) * current;
        ema[i] = Some(current);
    }

    ema
}

/// EMA over a sparse series, skipping the leading `None` run
pub(crate) fn calculate_ema_sparse(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let offset = values.iter().take_while(|v| v.is_none()).count();
    let dense: Vec<f64> = values[offset..].iter().map_while(|v| *v).collect();

    let mut out = vec![None; values.len()];
    for (i, v) in calculate_ema(&dense, period).into_iter().enumerate() {
        out[offset + i] = v;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ema_seeded_with_sma() {
        let prices = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let ema = calculate_ema(&prices, 3);

        assert_eq!(ema.len(), prices.len());
        assert!(ema[1].is_none());
        assert_eq!(ema[2], Some(2.0)); // SMA of first 3 = (1+2+3)/3 = 2
        // alpha = 0.5: 0.5 * 4 + 0.5 * 2 = 3
        assert_relative_eq!(ema[3].unwrap(), 3.0);
    }

    #[test]
    fn test_ema_tracks_trend() {
        let prices = vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0];
        let ema = calculate_ema(&prices, 3);

        for i in 3..prices.len() {
            assert!(ema[i].unwrap() > ema[i - 1].unwrap());
            assert!(ema[i].unwrap() < prices[i]);
        }
    }

    #[test]
    fn test_ema_empty() {
        let prices: Vec<f64> = vec![];
        assert!(calculate_ema(&prices, 3).is_empty());
        assert!(calculate_ema(&[1.0, 2.0], 3).iter().all(|v| v.is_none()));
    }

    #[test]
    fn test_ema_sparse_alignment() {
        let values = vec![None, None, Some(1.0), Some(2.0), Some(3.0)];
        let ema = calculate_ema_sparse(&values, 2);

        assert_eq!(ema.len(), 5);
        assert!(ema[2].is_none());
        assert_eq!(ema[3], Some(1.5));
    }
}
