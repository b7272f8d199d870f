pub mod ma_cross;
pub mod rsi_reversion;

pub use ma_cross::MovingAverageCrossStrategy;
pub use rsi_reversion::RsiReversionStrategy;

use common::{Bar, Signal};

/// A causal source of per-bar trading signals
///
/// `signal_for` receives `bars[..=i]` and must only look at those bars.
/// Implementations keep incremental state for the usual case of consecutive
/// prefixes, and replay the window when called out of sequence so the
/// answer never depends on call order.
pub trait SignalSource {
    fn name(&self) -> &str;

    /// Bars needed before the first non-HOLD signal is possible
    fn warmup_len(&self) -> usize;

    /// Fraction of available capital committed per entry
    fn position_size(&self) -> f64;

    fn signal_for(&mut self, window: &[Bar]) -> Signal;

    /// Drop all incremental state
    fn reset(&mut self);
}

impl<S: SignalSource + ?Sized> SignalSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn warmup_len(&self) -> usize {
        (**self).warmup_len()
    }

    fn position_size(&self) -> f64 {
        (**self).position_size()
    }

    fn signal_for(&mut self, window: &[Bar]) -> Signal {
        (**self).signal_for(window)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Evaluate a source over every prefix of `bars`, starting from a clean state
pub fn generate_signals<S: SignalSource + ?Sized>(source: &mut S, bars: &[Bar]) -> Vec<Signal> {
    source.reset();
    (0..bars.len())
        .map(|i| source.signal_for(&bars[..=i]))
        .collect()
}
