use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

/// Open position in one symbol. `quantity` is always > 0 while the position
/// exists; direction lives in `side`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: PositionSide,
    pub quantity: f64,
    /// Volume-weighted average entry price.
    pub entry_price: f64,
    /// Latest mark price.
    pub current_price: f64,
    /// Realized P&L accumulated by partial closes of this position.
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub opened_at: DateTime<Utc>,
}

impl Position {
    pub fn open(
        symbol: impl Into<String>,
        side: PositionSide,
        quantity: f64,
        price: f64,
        opened_at: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity,
            entry_price: price,
            current_price: price,
            realized_pnl: 0.0,
            unrealized_pnl: 0.0,
            opened_at,
        }
    }

    /// Quantity with sign: positive for longs, negative for shorts.
    pub fn signed_quantity(&self) -> f64 {
        match self.side {
            PositionSide::Long => self.quantity,
            PositionSide::Short => -self.quantity,
        }
    }

    /// Mark-to-market value contributed to equity.
    pub fn market_value(&self) -> f64 {
        self.signed_quantity() * self.current_price
    }

    /// Gross exposure, always non-negative.
    pub fn notional(&self) -> f64 {
        self.quantity * self.current_price
    }

    /// Update the mark and recompute unrealized P&L.
    pub fn mark(&mut self, price: f64) {
        self.current_price = price;
        self.unrealized_pnl = match self.side {
            PositionSide::Long => (price - self.entry_price) * self.quantity,
            PositionSide::Short => (self.entry_price - price) * self.quantity,
        };
    }
}
