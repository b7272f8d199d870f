use common::{Bar, Timestamp};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 2024-01-01T00:00:00Z
const SYNTHETIC_START: Timestamp = 1_704_067_200_000;

/// Generate a seeded random-walk bar series for testing
///
/// The same `(n, initial_price, seed, interval_ms)` always yields the same bars.
pub fn generate_synthetic_bars(
    n: usize,
    initial_price: f64,
    seed: u64,
    interval_ms: i64,
) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut bars = Vec::with_capacity(n);

    let mut price = initial_price;
    // Crypto-like hourly parameters
    let volatility = 0.01;
    let drift = 0.0001;

    for i in 0..n {
        let timestamp = SYNTHETIC_START + i as i64 * interval_ms;

        let random_return: f64 = rng.gen_range(-1.0..1.0);
        let bar_return = drift + volatility * random_return;
        let new_price = (price * (1.0 + bar_return)).max(f64::MIN_POSITIVE);

        let range = price * rng.gen_range(0.002..0.01);
        let open = price;
        let close = new_price;
        let high = open.max(close) + rng.gen_range(0.0..range);
        let low = (open.min(close) - rng.gen_range(0.0..range)).max(open.min(close) * 0.5);

        // Heavier volume on larger moves
        let base_volume = 1_000.0;
        let volume = base_volume * (1.0 + bar_return.abs() * 10.0) * rng.gen_range(0.8..1.2);

        let mut bar = Bar::new(timestamp, open, high, low, close, volume);
        bar.quote_volume = volume * (open + close) / 2.0;
        bar.trades_count = rng.gen_range(50..500);
        bars.push(bar);

        price = new_price;
    }

    bars
}
