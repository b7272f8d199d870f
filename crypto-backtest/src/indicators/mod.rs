pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use ema::calculate_ema;
pub use macd::{calculate_macd, Macd};
pub use rsi::{calculate_rsi, RsiState};
pub use sma::{calculate_sma, RollingWindow};

