//! Property tests for cleaner and engine invariants.
//!
//! 1. Cleaning is idempotent
//! 2. Runs are deterministic
//! 3. Equity accounting holds at the end of every run
//! 4. Drawdowns stay within [0, 1]

use proptest::prelude::*;

use crypto_backtest::{
    BacktestConfig, BacktestEngine, Bar, BarCleaner, CleanerConfig, MovingAverageCrossStrategy,
    PerformanceAnalyzer, StrategyConfig,
};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_raw_bar() -> impl Strategy<Value = Bar> {
    (
        0i64..200,
        prop_oneof![9 => 1.0..1000.0_f64, 1 => -10.0..0.0_f64],
        0.0..0.05_f64,
        prop_oneof![9 => 0.0..100.0_f64, 1 => -5.0..0.0_f64],
        any::<bool>(),
    )
        .prop_map(|(slot, close, spread, volume, inverted)| {
            let (high, low) = if inverted {
                (close * (1.0 - spread), close * (1.0 + spread))
            } else {
                (close * (1.0 + spread), close * (1.0 - spread))
            };
            Bar::new(slot * 60_000, close, high, low, close, volume)
        })
}

/// Valid, strictly ordered bars from a multiplicative random walk
fn arb_series() -> impl Strategy<Value = Vec<Bar>> {
    (
        50.0..5000.0_f64,
        prop::collection::vec(-0.05..0.05_f64, 30..200),
    )
        .prop_map(|(start, moves)| {
            let mut price = start;
            moves
                .iter()
                .enumerate()
                .map(|(i, r)| {
                    price *= 1.0 + r;
                    Bar::new(
                        i as i64 * 3_600_000,
                        price,
                        price * 1.001,
                        price * 0.999,
                        price,
                        10.0,
                    )
                })
                .collect()
        })
}

fn arb_ma_config() -> impl Strategy<Value = StrategyConfig> {
    (1usize..8, 1usize..20, 0.1..1.0_f64)
        .prop_map(|(fast, extra, size)| StrategyConfig::new(fast, fast + extra, size))
}

fn arb_costs() -> impl Strategy<Value = BacktestConfig> {
    (0.0..0.01_f64, 0.0..0.01_f64).prop_map(|(commission, slippage)| {
        BacktestConfig::default()
            .with_commission(commission)
            .with_slippage(slippage)
    })
}

// ── 1. Cleaner ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn cleaning_is_idempotent(raw in prop::collection::vec(arb_raw_bar(), 0..120)) {
        let cleaner = BarCleaner::new(CleanerConfig::default());
        if let Ok(once) = cleaner.clean(&raw) {
            let twice = cleaner.clean(&once).unwrap();
            prop_assert_eq!(&twice, &once);
            prop_assert!(once.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
            prop_assert!(once.iter().all(|b| b.has_valid_ohlc() && b.volume >= 0.0));
        }
    }
}

// ── 2-4. Engine ──────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn runs_are_deterministic(bars in arb_series(), config in arb_ma_config()) {
        prop_assume!(bars.len() >= config.slow_period);
        let engine = BacktestEngine::new(BacktestConfig::default()).unwrap();

        let first = engine
            .run(&bars, &mut MovingAverageCrossStrategy::new(config.clone()).unwrap())
            .unwrap();
        let second = engine
            .run(&bars, &mut MovingAverageCrossStrategy::new(config).unwrap())
            .unwrap();

        prop_assert_eq!(first, second);
    }

    #[test]
    fn accounting_identity_holds(
        bars in arb_series(),
        config in arb_ma_config(),
        costs in arb_costs(),
    ) {
        prop_assume!(bars.len() >= config.slow_period);
        let initial = costs.initial_capital;
        let engine = BacktestEngine::new(costs).unwrap();
        let result = engine
            .run(&bars, &mut MovingAverageCrossStrategy::new(config).unwrap())
            .unwrap();

        let last_close = bars[bars.len() - 1].close;
        let realized: f64 = result.closed_trades().map(|t| t.realized_pnl).sum();
        let unrealized = result.open_trade().map_or(0.0, |t| {
            (last_close - t.entry_price) * t.quantity - t.commission_paid
        });
        let expected = initial + realized + unrealized;

        prop_assert!((result.final_equity - expected).abs() <= 1e-6 * initial);
        prop_assert_eq!(result.equity_curve.len(), result.timestamps.len());
        prop_assert_eq!(result.equity_curve.len(), bars.len());
        prop_assert!(result.final_capital >= 0.0);
    }

    #[test]
    fn drawdown_is_a_fraction(bars in arb_series(), config in arb_ma_config()) {
        prop_assume!(bars.len() >= config.slow_period);
        let engine = BacktestEngine::new(BacktestConfig::default()).unwrap();
        let result = engine
            .run(&bars, &mut MovingAverageCrossStrategy::new(config).unwrap())
            .unwrap();
        let metrics = PerformanceAnalyzer::analyze_result(&result);

        prop_assert!((0.0..=1.0).contains(&metrics.max_drawdown));
        prop_assert!(result
            .equity_curve
            .iter()
            .all(|p| (0.0..=1.0).contains(&p.drawdown_fraction)));
        prop_assert!(metrics.sharpe_ratio.is_finite());
        prop_assert!(metrics.profit_loss_ratio.is_finite());
    }
}
