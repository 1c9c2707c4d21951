//! Strategy contract and the signals strategies emit.

use serde::{Deserialize, Serialize};

use super::context::StrategyContext;
use crate::domain::{Bar, OrderId, OrderSide};
use crate::error::ConfigError;

/// A request to trade, turned into an order by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub side: OrderSide,
    /// Explicit size. Buys without one use the engine's sizing rule; sells
    /// without one close the whole position.
    pub quantity: Option<f64>,
    pub limit_price: Option<f64>,
    pub reason: String,
}

impl Signal {
    pub fn buy(symbol: impl Into<String>) -> Self {
        Self::new(symbol, OrderSide::Buy)
    }

    pub fn sell(symbol: impl Into<String>) -> Self {
        Self::new(symbol, OrderSide::Sell)
    }

    fn new(symbol: impl Into<String>, side: OrderSide) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity: None,
            limit_price: None,
            reason: String::new(),
        }
    }

    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_limit(mut self, price: f64) -> Self {
        self.limit_price = Some(price);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }
}

/// Trading logic driven by the backtest loop.
///
/// Strategies never touch the ledger; they read a snapshot through the
/// context and answer with signals.
pub trait Strategy: Send {
    fn name(&self) -> &str;

    /// Called once before the first bar. Register indicators here.
    fn initialize(&mut self, ctx: &mut StrategyContext) -> Result<(), ConfigError>;

    /// Called once per bar after indicators and marks are updated.
    fn on_candle(&mut self, bar: &Bar, ctx: &StrategyContext) -> Vec<Signal>;

    /// Called after every fill, including the closing fills that
    /// [`BacktestEngine::finish`](crate::engine::BacktestEngine::finish)
    /// books for positions still open at the end of the run.
    fn on_order_filled(&mut self, _order_id: OrderId, _ctx: &StrategyContext) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_builders() {
        let s = Signal::buy("ETH")
            .with_quantity(2.0)
            .with_limit(1_900.0)
            .with_reason("breakout");
        assert_eq!(s.side, OrderSide::Buy);
        assert_eq!(s.quantity, Some(2.0));
        assert_eq!(s.limit_price, Some(1_900.0));
        assert_eq!(s.reason, "breakout");
        assert_eq!(Signal::sell("ETH").quantity, None);
    }
}
