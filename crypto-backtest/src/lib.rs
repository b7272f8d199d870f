pub mod cleaner;
pub mod data;
pub mod engine;
pub mod indicators;
pub mod logging;
pub mod metrics;
pub mod portfolio;
pub mod strategy;
pub mod sweep;

pub use cleaner::{is_continuous, median_interval, BarCleaner, CleaningReport};
pub use data::{generate_synthetic_bars, load_file, BarSource, FileBarSource};
pub use engine::{BacktestEngine, CancelToken};
pub use metrics::{PerformanceAnalyzer, UNBOUNDED_RATIO};
pub use portfolio::Portfolio;
pub use strategy::{
    generate_signals, MovingAverageCrossStrategy, RsiReversionStrategy, SignalSource,
};
pub use sweep::{best_by, run_sweep, ParamGrid, SweepOutcome};

// Re-export common types
pub use common::{
    BacktestConfig, BacktestError, BacktestResult, Bar, CleanerConfig, DataQuality, EquityPoint,
    PerformanceMetrics, Position, Result, RsiConfig, Side, Signal, SignalType, StrategyConfig,
    Timeframe, Timestamp, Trade,
};
