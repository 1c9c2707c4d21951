//! Trade — immutable execution record produced by the fill simulator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{OrderId, TradeId};
use super::order::OrderSide;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub order_id: OrderId,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: f64,
    /// Fill price after slippage.
    pub price: f64,
    pub commission: f64,
    /// Dollar cost of slippage relative to the unslipped reference price.
    pub slippage: f64,
    /// Net realized P&L for trades that reduce or close a position.
    pub realized_pnl: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl Trade {
    pub fn notional(&self) -> f64 {
        self.quantity * self.price
    }

    pub fn is_closing(&self) -> bool {
        self.realized_pnl.is_some()
    }

    /// Closing trades with positive net P&L.
    pub fn is_winner(&self) -> bool {
        self.realized_pnl.is_some_and(|pnl| pnl > 0.0)
    }
}
