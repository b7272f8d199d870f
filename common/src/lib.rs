pub mod config;
pub mod error;
pub mod timeframe;
pub mod types;

pub use config::{BacktestConfig, CleanerConfig, RsiConfig, StrategyConfig};
pub use error::{BacktestError, Result};
pub use timeframe::Timeframe;
pub use types::*;
