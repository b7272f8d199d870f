use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use common::{BacktestConfig, BacktestError, BacktestResult, Bar, EquityPoint, Result, SignalType};
use tracing::{debug, info, info_span};

use crate::metrics::{drawdown_fraction, is_loss, is_win};
use crate::portfolio::Portfolio;
use crate::strategy::SignalSource;

/// Shared flag checked once per bar; a cancelled run returns what it has so far
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Bar-by-bar simulator for a single long-only position
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run backtest on provided bar data
    pub fn run<S: SignalSource + ?Sized>(
        &self,
        bars: &[Bar],
        strategy: &mut S,
    ) -> Result<BacktestResult> {
        self.run_with_cancel(bars, strategy, &CancelToken::new())
    }

    pub fn run_with_cancel<S: SignalSource + ?Sized>(
        &self,
        bars: &[Bar],
        strategy: &mut S,
        cancel: &CancelToken,
    ) -> Result<BacktestResult> {
        if let Some(i) = bars.windows(2).position(|w| w[1].timestamp <= w[0].timestamp) {
            return Err(BacktestError::backtest_config(
                "bars",
                format!(
                    "timestamps must be strictly increasing, bar {} at {} follows {}",
                    i + 1,
                    bars[i + 1].timestamp,
                    bars[i].timestamp
                ),
            ));
        }
        let warmup = strategy.warmup_len();
        if bars.len() < warmup {
            return Err(BacktestError::backtest_config(
                "bars",
                format!(
                    "{} bars is shorter than the {} bar warm-up of {}",
                    bars.len(),
                    warmup,
                    strategy.name()
                ),
            ));
        }

        let span = info_span!("backtest", strategy = strategy.name(), bars = bars.len());
        let _guard = span.enter();

        strategy.reset();
        let position_size = strategy.position_size();
        let commission_rate = self.config.commission_rate;
        let slippage_rate = self.config.slippage_rate;

        let mut portfolio = Portfolio::new(self.config.initial_capital);
        let mut equity_curve: Vec<EquityPoint> = Vec::with_capacity(bars.len());
        let mut timestamps = Vec::with_capacity(bars.len());
        let mut peak = f64::MIN;
        let mut completed = true;

        for i in 0..bars.len() {
            if cancel.is_cancelled() {
                info!(bars_processed = i, "backtest cancelled");
                completed = false;
                break;
            }
            let bar = &bars[i];
            let signal = strategy.signal_for(&bars[..=i]);

            match signal.signal_type {
                SignalType::Buy if !portfolio.has_position() => {
                    let fill = bar.close * (1.0 + slippage_rate);
                    let quantity =
                        portfolio.affordable_quantity(fill, position_size, commission_rate);
                    if quantity > 0.0 && quantity.is_finite() {
                        let commission = quantity * fill * commission_rate;
                        portfolio.open_position(quantity, fill, bar.timestamp, commission)?;
                        debug!(
                            timestamp = bar.timestamp,
                            price = fill,
                            quantity,
                            commission,
                            "opened long"
                        );
                    }
                }
                SignalType::Sell if portfolio.has_position() => {
                    let fill = bar.close * (1.0 - slippage_rate);
                    let quantity = portfolio.position().map_or(0.0, |p| p.quantity);
                    let commission = quantity * fill * commission_rate;
                    if let Some(trade) = portfolio.close_position(fill, bar.timestamp, commission) {
                        debug!(
                            timestamp = bar.timestamp,
                            price = fill,
                            pnl = trade.realized_pnl,
                            "closed long"
                        );
                    }
                }
                _ => {}
            }

            let equity = portfolio.equity(bar.close);
            peak = peak.max(equity);
            equity_curve.push(EquityPoint {
                timestamp: bar.timestamp,
                equity,
                drawdown_fraction: drawdown_fraction(peak, equity),
            });
            timestamps.push(bar.timestamp);
        }

        let initial_capital = self.config.initial_capital;
        let final_equity = equity_curve.last().map_or(initial_capital, |p| p.equity);
        let final_capital = portfolio.cash();
        let closed = portfolio.trades().iter().filter(|t| t.is_closed());
        let winning_trades = closed.clone().filter(|t| is_win(t.realized_pnl)).count() as u32;
        let losing_trades = closed.clone().filter(|t| is_loss(t.realized_pnl)).count() as u32;
        let total_trades = closed.count() as u32;
        let total_return = final_equity / initial_capital - 1.0;

        info!(
            final_equity,
            total_return,
            realized_pnl = portfolio.realized_pnl(),
            total_trades,
            completed,
            "backtest finished"
        );
        let trades = portfolio.into_trades();

        Ok(BacktestResult {
            initial_capital,
            final_capital,
            final_equity,
            total_return,
            total_trades,
            winning_trades,
            losing_trades,
            trades,
            bars_processed: equity_curve.len(),
            equity_curve,
            timestamps,
            completed,
        })
    }
}
