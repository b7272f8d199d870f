use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Millisecond Unix timestamp
pub type Timestamp = i64;

/// Data quality flag assigned by the bar cleaner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataQuality {
    #[default]
    Good,
    /// Price jump or volume spike relative to recent history
    Suspicious,
    /// Interval since the previous bar exceeds the gap threshold
    Gap,
}

/// OHLCV bar data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: Timestamp,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default)]
    pub quote_volume: f64,
    #[serde(default)]
    pub trades_count: u64,
    #[serde(default)]
    pub quality: DataQuality,
}

impl Bar {
    pub fn new(
        timestamp: Timestamp,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            quote_volume: 0.0,
            trades_count: 0,
            quality: DataQuality::Good,
        }
    }

    /// low <= min(open, close) <= max(open, close) <= high
    pub fn has_valid_ohlc(&self) -> bool {
        self.low <= self.open.min(self.close) && self.open.max(self.close) <= self.high
    }

    pub fn has_positive_prices(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite() && *p > 0.0)
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// Trade side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

/// Signal type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalType {
    Buy,
    Sell,
    Hold,
}

/// Trading signal for a single bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub timestamp: Timestamp,
    pub signal_type: SignalType,
}

impl Signal {
    pub fn new(timestamp: Timestamp, signal_type: SignalType) -> Self {
        Self {
            timestamp,
            signal_type,
        }
    }

    pub fn hold(timestamp: Timestamp) -> Self {
        Self::new(timestamp, SignalType::Hold)
    }

    pub fn is_hold(&self) -> bool {
        self.signal_type == SignalType::Hold
    }
}

/// Open long position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub entry_price: f64,
    pub quantity: f64,
    pub entry_timestamp: Timestamp,
    pub entry_commission: f64,
}

impl Position {
    pub fn entry_notional(&self) -> f64 {
        self.quantity * self.entry_price
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }

    /// Mark-to-market P&L net of the commission already paid on entry
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.quantity - self.entry_commission
    }
}

/// Individual trade record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub entry_timestamp: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_timestamp: Option<Timestamp>,
    pub side: Side,
    pub entry_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_price: Option<f64>,
    pub quantity: f64,
    pub commission_paid: f64,
    pub realized_pnl: f64,
}

impl Trade {
    pub fn is_closed(&self) -> bool {
        self.exit_timestamp.is_some()
    }

    pub fn holding_period_ms(&self) -> Option<i64> {
        self.exit_timestamp.map(|exit| exit - self.entry_timestamp)
    }
}

/// One point of the equity curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: Timestamp,
    pub equity: f64,
    pub drawdown_fraction: f64,
}

/// Performance metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    // Returns
    pub cumulative_return: f64,
    pub annualized_return: f64,
    pub periods_per_year: f64,
    // Risk metrics
    pub max_drawdown: f64,
    pub volatility: f64,
    pub downside_deviation: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    // Trade statistics
    pub total_trades: u32,
    pub winning_trades: u32,
    pub losing_trades: u32,
    pub win_rate: f64,
    pub profit_loss_ratio: f64,
    pub max_consecutive_wins: u32,
    pub max_consecutive_losses: u32,
    /// Milliseconds
    pub avg_holding_period: f64,
    pub trade_frequency_per_year: f64,
}

impl PerformanceMetrics {
    pub fn avg_holding_period_days(&self) -> f64 {
        self.avg_holding_period / (24.0 * 3600.0 * 1000.0)
    }
}

/// Backtest result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub initial_capital: f64,
    pub final_capital: f64,
    pub final_equity: f64,
    pub total_return: f64,
    pub total_trades: u32,
    pub winning_trades: u32,
    pub losing_trades: u32,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub timestamps: Vec<Timestamp>,
    pub bars_processed: usize,
    /// False when the run was cancelled before the last bar
    pub completed: bool,
}

impl BacktestResult {
    pub fn closed_trades(&self) -> impl Iterator<Item = &Trade> {
        self.trades.iter().filter(|t| t.is_closed())
    }

    pub fn open_trade(&self) -> Option<&Trade> {
        self.trades.last().filter(|t| !t.is_closed())
    }

    pub fn equity_values(&self) -> Vec<f64> {
        self.equity_curve.iter().map(|p| p.equity).collect()
    }
}
