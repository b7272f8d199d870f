use common::{BacktestConfig, Bar, PerformanceMetrics, Result, StrategyConfig};
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::engine::BacktestEngine;
use crate::metrics::PerformanceAnalyzer;
use crate::strategy::MovingAverageCrossStrategy;

/// Cartesian grid of moving-average cross parameters
#[derive(Debug, Clone)]
pub struct ParamGrid {
    pub fast_periods: Vec<usize>,
    pub slow_periods: Vec<usize>,
    pub position_sizes: Vec<f64>,
}

impl ParamGrid {
    pub fn new(fast_periods: Vec<usize>, slow_periods: Vec<usize>) -> Self {
        Self {
            fast_periods,
            slow_periods,
            position_sizes: vec![StrategyConfig::default().position_size],
        }
    }

    pub fn with_position_sizes(mut self, position_sizes: Vec<f64>) -> Self {
        self.position_sizes = position_sizes;
        self
    }

    /// Combinations with `fast < slow`, in fast/slow/size order
    pub fn configs(&self) -> Vec<StrategyConfig> {
        let mut configs = Vec::new();
        for &fast in &self.fast_periods {
            for &slow in &self.slow_periods {
                if fast >= slow {
                    continue;
                }
                for &size in &self.position_sizes {
                    configs.push(StrategyConfig::new(fast, slow, size));
                }
            }
        }
        configs
    }
}

/// Summary of one backtest in a sweep
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepOutcome {
    pub strategy: StrategyConfig,
    pub final_equity: f64,
    pub total_return: f64,
    pub total_trades: u32,
    pub metrics: PerformanceMetrics,
}

/// Execute every grid combination in parallel; results keep grid order
pub fn run_sweep(
    bars: &[Bar],
    grid: &ParamGrid,
    backtest_config: &BacktestConfig,
) -> Result<Vec<SweepOutcome>> {
    let configs = grid.configs();
    info!(combinations = configs.len(), bars = bars.len(), "starting sweep");

    configs
        .par_iter()
        .map(|config| run_one(bars, config, backtest_config))
        .collect::<Result<Vec<_>>>()
}

fn run_one(
    bars: &[Bar],
    config: &StrategyConfig,
    backtest_config: &BacktestConfig,
) -> Result<SweepOutcome> {
    let engine = BacktestEngine::new(backtest_config.clone())?;
    let mut strategy = MovingAverageCrossStrategy::new(config.clone())?;
    let result = engine.run(bars, &mut strategy)?;
    let metrics = PerformanceAnalyzer::analyze_result(&result);

    Ok(SweepOutcome {
        strategy: config.clone(),
        final_equity: result.final_equity,
        total_return: result.total_return,
        total_trades: result.total_trades,
        metrics,
    })
}

/// Outcome with the highest score; the earliest wins ties
pub fn best_by<F>(outcomes: &[SweepOutcome], score: F) -> Option<&SweepOutcome>
where
    F: Fn(&PerformanceMetrics) -> f64,
{
    outcomes.iter().fold(None, |best, outcome| match best {
        Some(b) if score(&b.metrics) >= score(&outcome.metrics) => Some(b),
        _ => Some(outcome),
    })
}
