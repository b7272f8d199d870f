/// Fixed-capacity ring buffer with an incrementally maintained sum
///
/// Each `push` is O(1): the value leaving the window is subtracted from the
/// running sum as the new value is added.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    buffer: Vec<f64>,
    capacity: usize,
    head: usize,
    len: usize,
    sum: f64,
}

impl RollingWindow {
    /// A zero capacity is bumped to one so the window is always usable.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: vec![0.0; capacity],
            capacity,
            head: 0,
            len: 0,
            sum: 0.0,
        }
    }

    /// Push a value, returning the one evicted once the window is full
    pub fn push(&mut self, value: f64) -> Option<f64> {
        let evicted = if self.len == self.capacity {
            let old = self.buffer[self.head];
            self.sum -= old;
            Some(old)
        } else {
            self.len += 1;
            None
        };

        self.buffer[self.head] = value;
        self.sum += value;
        self.head = (self.head + 1) % self.capacity;
        evicted
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Mean of the window, available only once it is full
    pub fn mean(&self) -> Option<f64> {
        if self.is_full() {
            Some(self.sum / self.capacity as f64)
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
        self.sum = 0.0;
    }
}

/// Calculate Simple Moving Average
///
/// # Arguments
/// * `prices` - Slice of prices
/// * `period` - SMA period
///
/// # Returns
/// Vector of Option<f64>, None for values before enough data is available
pub fn calculate_sma(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; prices.len()];
    }

    let mut window = RollingWindow::new(period);
    prices
        .iter()
        .map(|&price| {
            window.push(price);
            window.mean()
        })
        .collect()
}
