use common::{BacktestError, Position, Result, Side, Timestamp, Trade};

/// Relative slack allowed when a fill consumes the entire cash balance
const CASH_TOLERANCE: f64 = 1e-9;

/// Single-position long-only book: cash, the open position and the trade log
#[derive(Debug)]
pub struct Portfolio {
    cash: f64,
    position: Option<Position>,
    realized_pnl: f64,
    trades: Vec<Trade>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            cash: initial_capital,
            position: None,
            realized_pnl: 0.0,
            trades: Vec::new(),
        }
    }

    /// Get available cash
    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// Cash plus the open position valued at `price`
    pub fn equity(&self, price: f64) -> f64 {
        self.cash + self.position.as_ref().map_or(0.0, |p| p.market_value(price))
    }

    pub fn has_position(&self) -> bool {
        self.position.is_some()
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    /// Sum of realized P&L over closed trades
    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.position
            .as_ref()
            .map_or(0.0, |p| p.unrealized_pnl(price))
    }

    /// Trade log in chronological order; the last entry may still be open
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn into_trades(self) -> Vec<Trade> {
        self.trades
    }

    /// Quantity such that notional plus commission equals `cash * position_size`
    pub fn affordable_quantity(
        &self,
        fill_price: f64,
        position_size: f64,
        commission_rate: f64,
    ) -> f64 {
        if fill_price <= 0.0 {
            return 0.0;
        }
        (self.cash * position_size) / (fill_price * (1.0 + commission_rate))
    }

    /// Open a long position and append its opening trade record
    pub fn open_position(
        &mut self,
        quantity: f64,
        price: f64,
        timestamp: Timestamp,
        commission: f64,
    ) -> Result<()> {
        if let Some(pos) = &self.position {
            return Err(BacktestError::PositionAlreadyOpen {
                entry_timestamp: pos.entry_timestamp,
            });
        }

        let cost = quantity * price + commission;
        if cost > self.cash * (1.0 + CASH_TOLERANCE) {
            return Err(BacktestError::InsufficientCash {
                required: cost,
                available: self.cash,
            });
        }

        self.cash = (self.cash - cost).max(0.0);
        self.position = Some(Position {
            entry_price: price,
            quantity,
            entry_timestamp: timestamp,
            entry_commission: commission,
        });
        self.trades.push(Trade {
            entry_timestamp: timestamp,
            exit_timestamp: None,
            side: Side::Buy,
            entry_price: price,
            exit_price: None,
            quantity,
            commission_paid: commission,
            realized_pnl: 0.0,
        });
        Ok(())
    }

    /// Close the open position and finalize its trade record
    pub fn close_position(
        &mut self,
        price: f64,
        timestamp: Timestamp,
        commission: f64,
    ) -> Option<&Trade> {
        let position = self.position.take()?;

        let proceeds = position.quantity * price - commission;
        let pnl = (price - position.entry_price) * position.quantity
            - position.entry_commission
            - commission;

        self.cash += proceeds;
        self.realized_pnl += pnl;

        let trade = self.trades.last_mut().filter(|t| !t.is_closed())?;
        trade.exit_timestamp = Some(timestamp);
        trade.exit_price = Some(price);
        trade.commission_paid += commission;
        trade.realized_pnl = pnl;
        Some(trade)
    }
}
