use common::{BacktestResult, EquityPoint, PerformanceMetrics, Timestamp, Trade};
use tracing::warn;

/// Milliseconds in a Julian year
pub const MS_PER_YEAR: f64 = 365.25 * 24.0 * 3600.0 * 1000.0;

/// Reported profit/loss ratio when there are winning trades and no losers
pub const UNBOUNDED_RATIO: f64 = f64::MAX;

/// Trades with |pnl| at or below this are neither wins nor losses
pub const PNL_EPSILON: f64 = 1e-8;

pub(crate) fn is_win(pnl: f64) -> bool {
    pnl > PNL_EPSILON
}

pub(crate) fn is_loss(pnl: f64) -> bool {
    pnl < -PNL_EPSILON
}

/// NaN becomes 0 and infinities saturate to the largest finite value
fn finite(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(f64::MIN, f64::MAX)
    }
}

/// Derives return and risk statistics from an equity curve and trade log
///
/// The risk-free rate is taken as zero.
pub struct PerformanceAnalyzer;

impl PerformanceAnalyzer {
    /// Calculate all performance metrics
    pub fn analyze(
        equity_curve: &[EquityPoint],
        timestamps: &[Timestamp],
        trades: &[Trade],
        initial_capital: f64,
    ) -> PerformanceMetrics {
        if equity_curve.is_empty() {
            return PerformanceMetrics::default();
        }
        if equity_curve.len() != timestamps.len() {
            warn!(
                equity_points = equity_curve.len(),
                timestamps = timestamps.len(),
                "equity curve and timestamps differ in length"
            );
            return PerformanceMetrics::default();
        }

        let equity: Vec<f64> = equity_curve.iter().map(|p| p.equity).collect();
        let returns = Self::calculate_returns(&equity);
        let periods_per_year = Self::periods_per_year(timestamps);
        let annualizer = periods_per_year.sqrt();

        let final_equity = equity[equity.len() - 1];
        let cumulative_return = if initial_capital > 0.0 {
            final_equity / initial_capital - 1.0
        } else {
            0.0
        };
        let annualized_return =
            Self::annualized_return(cumulative_return, periods_per_year, returns.len());

        let max_drawdown = Self::max_drawdown(&equity);
        let volatility = finite(Self::std_dev(&returns) * annualizer);
        let downside_deviation = finite(Self::downside_deviation(&returns) * annualizer);

        let sharpe_ratio = Self::ratio(annualized_return, volatility);
        let sortino_ratio = Self::ratio(annualized_return, downside_deviation);
        let calmar_ratio = Self::ratio(annualized_return, max_drawdown);

        let stats = Self::trade_stats(trades);
        let years = (timestamps[timestamps.len() - 1] - timestamps[0]) as f64 / MS_PER_YEAR;
        let trade_frequency_per_year = if years > 0.0 {
            finite(stats.closed as f64 / years)
        } else {
            0.0
        };

        PerformanceMetrics {
            cumulative_return: finite(cumulative_return),
            annualized_return,
            periods_per_year: finite(periods_per_year),
            max_drawdown,
            volatility,
            downside_deviation,
            sharpe_ratio,
            sortino_ratio,
            calmar_ratio,
            total_trades: stats.closed,
            winning_trades: stats.winning,
            losing_trades: stats.losing,
            win_rate: stats.win_rate,
            profit_loss_ratio: stats.profit_loss_ratio,
            max_consecutive_wins: stats.max_consecutive_wins,
            max_consecutive_losses: stats.max_consecutive_losses,
            avg_holding_period: stats.avg_holding_period,
            trade_frequency_per_year,
        }
    }

    pub fn analyze_result(result: &BacktestResult) -> PerformanceMetrics {
        Self::analyze(
            &result.equity_curve,
            &result.timestamps,
            &result.trades,
            result.initial_capital,
        )
    }

    /// Periodic returns r_t = e_t / e_{t-1} - 1
    pub fn calculate_returns(equity: &[f64]) -> Vec<f64> {
        equity
            .windows(2)
            .map(|w| if w[0] > 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
            .collect()
    }

    /// Bars per year implied by the median spacing of the timestamps
    pub fn periods_per_year(timestamps: &[Timestamp]) -> f64 {
        match crate::cleaner::median_interval(timestamps) {
            Some(median) if median > 0 => MS_PER_YEAR / median as f64,
            _ => 0.0,
        }
    }

    /// (1 + cumulative)^(periods_per_year / periods) - 1
    pub fn annualized_return(cumulative_return: f64, periods_per_year: f64, periods: usize) -> f64 {
        if periods == 0 || periods_per_year <= 0.0 {
            return 0.0;
        }
        let growth = 1.0 + cumulative_return;
        if growth <= 0.0 {
            return -1.0;
        }
        finite(growth.powf(periods_per_year / periods as f64) - 1.0)
    }

    /// Largest peak-to-trough decline as a fraction of the peak
    pub fn max_drawdown(equity: &[f64]) -> f64 {
        Self::drawdown_curve(equity)
            .into_iter()
            .fold(0.0, f64::max)
    }

    /// Drawdown fraction at every point of the curve
    pub fn drawdown_curve(equity: &[f64]) -> Vec<f64> {
        let mut peak = f64::MIN;
        equity
            .iter()
            .map(|&value| {
                peak = peak.max(value);
                drawdown_fraction(peak, value)
            })
            .collect()
    }

    /// Population standard deviation; 0 for fewer than two values
    fn std_dev(values: &[f64]) -> f64 {
        if values.len() < 2 {
            return 0.0;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        variance.sqrt()
    }

    /// Root mean square of the negative returns, measured from zero; 0 if none
    pub fn downside_deviation(returns: &[f64]) -> f64 {
        let (sum_sq, count) = returns
            .iter()
            .filter(|r| **r < 0.0)
            .fold((0.0, 0usize), |(sum, n), r| (sum + r * r, n + 1));
        if count == 0 {
            return 0.0;
        }
        (sum_sq / count as f64).sqrt()
    }

    fn ratio(numerator: f64, denominator: f64) -> f64 {
        if denominator == 0.0 {
            0.0
        } else {
            finite(numerator / denominator)
        }
    }

    /// Statistics over closed trades in log order
    fn trade_stats(trades: &[Trade]) -> TradeStats {
        let mut stats = TradeStats::default();
        let mut total_wins = 0.0;
        let mut total_losses = 0.0;
        let mut total_holding = 0.0;
        let mut win_streak = 0u32;
        let mut loss_streak = 0u32;

        for trade in trades.iter().filter(|t| t.is_closed()) {
            stats.closed += 1;
            total_holding += trade.holding_period_ms().unwrap_or(0) as f64;

            let pnl = trade.realized_pnl;
            if is_win(pnl) {
                stats.winning += 1;
                total_wins += pnl;
                win_streak += 1;
                loss_streak = 0;
            } else if is_loss(pnl) {
                stats.losing += 1;
                total_losses += pnl.abs();
                loss_streak += 1;
                win_streak = 0;
            }
            stats.max_consecutive_wins = stats.max_consecutive_wins.max(win_streak);
            stats.max_consecutive_losses = stats.max_consecutive_losses.max(loss_streak);
        }

        if stats.closed == 0 {
            return stats;
        }

        stats.win_rate = stats.winning as f64 / stats.closed as f64;
        stats.avg_holding_period = total_holding / stats.closed as f64;
        stats.profit_loss_ratio = match (stats.winning, stats.losing) {
            (0, _) => 0.0,
            (_, 0) => UNBOUNDED_RATIO,
            (w, l) => finite((total_wins / w as f64) / (total_losses / l as f64)),
        };
        stats
    }
}

/// (peak - equity) / peak, floored at zero
pub(crate) fn drawdown_fraction(peak: f64, equity: f64) -> f64 {
    if peak > 0.0 {
        ((peak - equity) / peak).max(0.0)
    } else {
        0.0
    }
}

#[derive(Debug, Default)]
struct TradeStats {
    closed: u32,
    winning: u32,
    losing: u32,
    win_rate: f64,
    profit_loss_ratio: f64,
    max_consecutive_wins: u32,
    max_consecutive_losses: u32,
    avg_holding_period: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use common::Side;

    const DAY: i64 = 24 * 3600 * 1000;

    fn make_equity_curve(values: &[f64]) -> (Vec<EquityPoint>, Vec<Timestamp>) {
        let mut peak = f64::MIN;
        let points: Vec<EquityPoint> = values
            .iter()
            .enumerate()
            .map(|(i, &equity)| {
                peak = peak.max(equity);
                EquityPoint {
                    timestamp: i as i64 * DAY,
                    equity,
                    drawdown_fraction: drawdown_fraction(peak, equity),
                }
            })
            .collect();
        let timestamps = points.iter().map(|p| p.timestamp).collect();
        (points, timestamps)
    }

    fn closed_trade(entry: i64, exit: i64, pnl: f64) -> Trade {
        Trade {
            entry_timestamp: entry,
            exit_timestamp: Some(exit),
            side: Side::Buy,
            entry_price: 100.0,
            exit_price: Some(100.0 + pnl),
            quantity: 1.0,
            commission_paid: 0.0,
            realized_pnl: pnl,
        }
    }

    #[test]
    fn test_basic_returns() {
        let (equity, ts) = make_equity_curve(&[10000.0, 10100.0, 10200.0, 10300.0, 10400.0]);
        let metrics = PerformanceAnalyzer::analyze(&equity, &ts, &[], 10000.0);

        assert_relative_eq!(metrics.cumulative_return, 0.04, epsilon = 1e-12);
        assert_relative_eq!(metrics.periods_per_year, 365.25, epsilon = 1e-9);
        let expected = 1.04_f64.powf(365.25 / 4.0) - 1.0;
        assert_relative_eq!(metrics.annualized_return, expected, max_relative = 1e-9);
        assert_eq!(metrics.max_drawdown, 0.0);
        assert_eq!(metrics.calmar_ratio, 0.0);
        assert_eq!(metrics.downside_deviation, 0.0);
        assert_eq!(metrics.sortino_ratio, 0.0);
        assert!(metrics.sharpe_ratio > 0.0);
    }

    #[test]
    fn test_max_drawdown() {
        let equity = [10000.0, 11000.0, 9000.0, 9500.0, 10500.0];
        let max_dd = PerformanceAnalyzer::max_drawdown(&equity);

        // Peak was 11000, trough was 9000
        assert_relative_eq!(max_dd, 2000.0 / 11000.0, epsilon = 1e-12);
    }

    #[test]
    fn test_drawdown_curve() {
        let dd_curve = PerformanceAnalyzer::drawdown_curve(&[10000.0, 11000.0, 10000.0, 9000.0]);

        assert_eq!(dd_curve.len(), 4);
        assert_eq!(dd_curve[0], 0.0);
        assert_eq!(dd_curve[1], 0.0);
        assert_relative_eq!(dd_curve[2], 1000.0 / 11000.0);
        assert_relative_eq!(dd_curve[3], 2000.0 / 11000.0);
    }

    #[test]
    fn test_flat_curve_is_all_zero() {
        let (equity, ts) = make_equity_curve(&[10000.0; 30]);
        let metrics = PerformanceAnalyzer::analyze(&equity, &ts, &[], 10000.0);

        assert_eq!(metrics.cumulative_return, 0.0);
        assert_eq!(metrics.annualized_return, 0.0);
        assert_eq!(metrics.volatility, 0.0);
        assert_eq!(metrics.sharpe_ratio, 0.0);
        assert_eq!(metrics.sortino_ratio, 0.0);
        assert_eq!(metrics.max_drawdown, 0.0);
    }

    #[test]
    fn test_single_point_curve() {
        let (equity, ts) = make_equity_curve(&[10500.0]);
        let metrics = PerformanceAnalyzer::analyze(&equity, &ts, &[], 10000.0);

        assert_relative_eq!(metrics.cumulative_return, 0.05, epsilon = 1e-12);
        assert_eq!(metrics.periods_per_year, 0.0);
        assert_eq!(metrics.annualized_return, 0.0);
        assert_eq!(metrics.volatility, 0.0);
        assert_eq!(metrics.trade_frequency_per_year, 0.0);
    }

    #[test]
    fn test_volatility_and_downside() {
        let (equity, ts) = make_equity_curve(&[100.0, 110.0, 99.0, 108.9, 98.01]);
        let metrics = PerformanceAnalyzer::analyze(&equity, &ts, &[], 100.0);

        // Returns alternate +10% / -10%: population stdev 0.1
        assert_relative_eq!(metrics.volatility, 0.1 * 365.25_f64.sqrt(), max_relative = 1e-9);
        // Equal -10% losses still carry downside risk
        assert_relative_eq!(
            metrics.downside_deviation,
            0.1 * 365.25_f64.sqrt(),
            max_relative = 1e-9
        );
        assert!(metrics.sharpe_ratio < 0.0);
        assert_relative_eq!(
            metrics.sortino_ratio,
            metrics.annualized_return / metrics.downside_deviation,
            max_relative = 1e-12
        );
        assert!(metrics.sortino_ratio < 0.0);
        assert!(metrics.max_drawdown > 0.0 && metrics.max_drawdown <= 1.0);
    }

    #[test]
    fn test_single_loss_downside() {
        let (equity, ts) = make_equity_curve(&[100.0, 101.0, 102.0, 90.0, 95.0]);
        let metrics = PerformanceAnalyzer::analyze(&equity, &ts, &[], 100.0);

        let loss: f64 = 90.0 / 102.0 - 1.0;
        assert_relative_eq!(
            metrics.downside_deviation,
            loss.abs() * 365.25_f64.sqrt(),
            max_relative = 1e-9
        );
        assert!(metrics.annualized_return < 0.0);
        assert!(metrics.sortino_ratio < 0.0);
    }

    #[test]
    fn test_downside_deviation_from_zero() {
        assert_eq!(PerformanceAnalyzer::downside_deviation(&[0.01, 0.02, 0.0]), 0.0);
        assert_eq!(PerformanceAnalyzer::downside_deviation(&[]), 0.0);
        // sqrt((0.03^2 + 0.04^2) / 2)
        assert_relative_eq!(
            PerformanceAnalyzer::downside_deviation(&[-0.03, 0.05, -0.04]),
            (0.00125_f64).sqrt(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_profit_loss_ratio_sentinel() {
        let (equity, ts) = make_equity_curve(&[100.0, 101.0, 102.0]);
        let trades = vec![closed_trade(0, DAY, 5.0), closed_trade(DAY, 2 * DAY, 3.0)];
        let metrics = PerformanceAnalyzer::analyze(&equity, &ts, &trades, 100.0);

        assert_eq!(metrics.profit_loss_ratio, UNBOUNDED_RATIO);
        assert!(metrics.profit_loss_ratio.is_finite());
        assert_eq!(metrics.winning_trades, 2);
        assert_eq!(metrics.losing_trades, 0);
    }

    #[test]
    fn test_trade_statistics() {
        let (equity, ts) = make_equity_curve(&vec![100.0; 366]);
        let trades = vec![
            closed_trade(0, DAY, 4.0),
            closed_trade(DAY, 3 * DAY, 2.0),
            closed_trade(3 * DAY, 4 * DAY, -1.0),
            closed_trade(4 * DAY, 5 * DAY, -2.0),
            closed_trade(5 * DAY, 6 * DAY, -3.0),
            closed_trade(6 * DAY, 7 * DAY, 0.0),
            closed_trade(7 * DAY, 8 * DAY, 6.0),
            Trade {
                exit_timestamp: None,
                exit_price: None,
                ..closed_trade(8 * DAY, 8 * DAY, 0.0)
            },
        ];
        let metrics = PerformanceAnalyzer::analyze(&equity, &ts, &trades, 100.0);

        assert_eq!(metrics.total_trades, 7);
        assert_eq!(metrics.winning_trades, 3);
        assert_eq!(metrics.losing_trades, 3);
        assert_eq!(metrics.max_consecutive_wins, 2);
        assert_eq!(metrics.max_consecutive_losses, 3);
        // mean win 4, mean loss 2
        assert_relative_eq!(metrics.profit_loss_ratio, 2.0);
        assert_relative_eq!(metrics.avg_holding_period, 8.0 * DAY as f64 / 7.0);
        assert_relative_eq!(metrics.win_rate, 3.0 / 7.0);
        // 365 days span
        assert_relative_eq!(
            metrics.trade_frequency_per_year,
            7.0 / (365.0 / 365.25),
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_no_wins_gives_zero_ratio() {
        let (equity, ts) = make_equity_curve(&[100.0, 99.0]);
        let trades = vec![closed_trade(0, DAY, -1.0)];
        let metrics = PerformanceAnalyzer::analyze(&equity, &ts, &trades, 100.0);

        assert_eq!(metrics.profit_loss_ratio, 0.0);
        assert_eq!(metrics.max_consecutive_losses, 1);
    }

    #[test]
    fn test_mismatched_lengths_yield_defaults() {
        let (equity, _) = make_equity_curve(&[100.0, 101.0]);
        let metrics = PerformanceAnalyzer::analyze(&equity, &[0], &[], 100.0);
        assert_eq!(metrics, PerformanceMetrics::default());
    }

    #[test]
    fn test_extreme_growth_stays_finite() {
        let mut values = vec![100.0];
        for _ in 0..5 {
            values.push(values[values.len() - 1] * 3.0);
        }
        let equity: Vec<EquityPoint> = values
            .iter()
            .enumerate()
            .map(|(i, &equity)| EquityPoint {
                timestamp: i as i64 * 1_000,
                equity,
                drawdown_fraction: 0.0,
            })
            .collect();
        let ts: Vec<Timestamp> = equity.iter().map(|p| p.timestamp).collect();
        let metrics = PerformanceAnalyzer::analyze(&equity, &ts, &[], 100.0);

        assert_eq!(metrics.annualized_return, f64::MAX);
        assert!(metrics.sharpe_ratio.is_finite());
        assert!(metrics.calmar_ratio.is_finite());
    }
}
