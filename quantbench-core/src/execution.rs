//! Fill simulation — slippage and commission.
//!
//! Reference price is the order's limit price if set, else the bar close.
//! Slippage is directional: buyers pay `ref · (1 + s)`, sellers receive
//! `ref · (1 − s)`. Commission is `qty · fill · rate`.

use crate::domain::{Bar, OrderId, OrderRequest, OrderSide, Trade, TradeId};
use crate::error::ConfigError;
use crate::ledger::{realized_pnl, PortfolioSnapshot};
use crate::risk::FillQuote;

/// Execution friction as fractions of price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    /// Slippage as a fraction of the reference price.
    pub slippage: f64,
    /// Commission as a fraction of fill notional.
    pub commission_rate: f64,
}

impl CostModel {
    pub fn new(slippage: f64, commission_rate: f64) -> Result<Self, ConfigError> {
        check_fraction("slippage", slippage)?;
        check_fraction("commission_rate", commission_rate)?;
        Ok(Self {
            slippage,
            commission_rate,
        })
    }

    pub fn frictionless() -> Self {
        Self {
            slippage: 0.0,
            commission_rate: 0.0,
        }
    }

    /// Apply slippage to a raw fill price.
    ///
    /// Returns `(slipped_price, slippage_dollar_amount)`.
    pub fn apply_slippage(&self, raw_price: f64, side: OrderSide, quantity: f64) -> (f64, f64) {
        if self.slippage == 0.0 {
            return (raw_price, 0.0);
        }
        match side {
            OrderSide::Buy => {
                let slipped = raw_price * (1.0 + self.slippage);
                (slipped, (slipped - raw_price) * quantity)
            }
            OrderSide::Sell => {
                let slipped = raw_price * (1.0 - self.slippage);
                (slipped, (raw_price - slipped) * quantity)
            }
        }
    }

    pub fn commission(&self, fill_price: f64, quantity: f64) -> f64 {
        quantity * fill_price * self.commission_rate
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self::frictionless()
    }
}

fn check_fraction(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..1.0).contains(&value) {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min: 0.0,
            max: 1.0,
        });
    }
    Ok(())
}

/// Deterministic fill simulator. Every accepted order fills in full.
#[derive(Debug, Clone, Default)]
pub struct FillSimulator {
    cost: CostModel,
}

impl FillSimulator {
    pub fn new(cost: CostModel) -> Self {
        Self { cost }
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.cost
    }

    /// Price and costs the order would fill at on `bar`.
    pub fn quote(&self, request: &OrderRequest, bar: &Bar) -> FillQuote {
        let reference = request.limit_price.unwrap_or(bar.close);
        let (price, slippage) = self
            .cost
            .apply_slippage(reference, request.side, request.quantity);
        FillQuote {
            price,
            commission: self.cost.commission(price, request.quantity),
            slippage,
        }
    }

    /// Build the trade for an accepted order. Sells carry realized P&L
    /// against the entry price of the position in `portfolio`.
    pub fn execute(
        &self,
        trade_id: TradeId,
        order_id: OrderId,
        request: &OrderRequest,
        quote: &FillQuote,
        portfolio: &PortfolioSnapshot,
    ) -> Trade {
        let realized = match request.side {
            OrderSide::Buy => None,
            OrderSide::Sell => portfolio.position(&request.symbol).map(|pos| {
                realized_pnl(pos.entry_price, quote.price, request.quantity, quote.commission)
            }),
        };
        Trade {
            id: trade_id,
            order_id,
            symbol: request.symbol.clone(),
            side: request.side,
            quantity: request.quantity,
            price: quote.price,
            commission: quote.commission,
            slippage: quote.slippage,
            realized_pnl: realized,
            timestamp: request.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Timeframe;
    use crate::ledger::Ledger;
    use chrono::{TimeZone, Utc};

    fn bar(close: f64) -> Bar {
        Bar {
            symbol: "SPY".into(),
            timeframe: Timeframe::OneDay,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000.0,
        }
    }

    fn request(side: OrderSide, quantity: f64, limit: Option<f64>) -> OrderRequest {
        OrderRequest {
            symbol: "SPY".into(),
            side,
            quantity,
            limit_price: limit,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn slippage_is_directional() {
        let cost = CostModel::new(0.001, 0.0).unwrap();
        let (buy, buy_cost) = cost.apply_slippage(100.0, OrderSide::Buy, 10.0);
        let (sell, sell_cost) = cost.apply_slippage(100.0, OrderSide::Sell, 10.0);
        assert!((buy - 100.1).abs() < 1e-10);
        assert!((sell - 99.9).abs() < 1e-10);
        assert!((buy_cost - 1.0).abs() < 1e-9);
        assert!((sell_cost - 1.0).abs() < 1e-9);
    }

    #[test]
    fn quote_uses_close_or_limit() {
        let sim = FillSimulator::new(CostModel::new(0.0, 0.001).unwrap());
        let q = sim.quote(&request(OrderSide::Buy, 10.0, None), &bar(50.0));
        assert_eq!(q.price, 50.0);
        assert!((q.commission - 0.5).abs() < 1e-12);

        let q = sim.quote(&request(OrderSide::Buy, 10.0, Some(48.0)), &bar(50.0));
        assert_eq!(q.price, 48.0);
    }

    #[test]
    fn sell_trade_carries_realized_pnl() {
        let sim = FillSimulator::new(CostModel::new(0.01, 0.001).unwrap());
        let mut ledger = Ledger::new(10_000.0);
        let buy = request(OrderSide::Buy, 10.0, None);
        let q = sim.quote(&buy, &bar(100.0));
        let t = sim.execute(TradeId(1), OrderId(1), &buy, &q, &ledger.snapshot());
        assert!(t.realized_pnl.is_none());
        ledger.apply_trade(&t).unwrap();

        let sell = request(OrderSide::Sell, 10.0, None);
        let q = sim.quote(&sell, &bar(110.0));
        let t = sim.execute(TradeId(2), OrderId(2), &sell, &q, &ledger.snapshot());
        // entry 101, fill 108.9, commission 10 * 108.9 * 0.001
        let expected = (108.9 - 101.0) * 10.0 - 10.0 * 108.9 * 0.001;
        assert!((t.realized_pnl.unwrap() - expected).abs() < 1e-9);
        match ledger.apply_trade(&t).unwrap() {
            crate::ledger::PositionTransition::Closed { realized_pnl } => {
                assert!((realized_pnl - expected).abs() < 1e-9)
            }
            other => panic!("expected close, got {other:?}"),
        }
    }

    #[test]
    fn cost_model_rejects_out_of_range() {
        assert!(CostModel::new(-0.01, 0.0).is_err());
        assert!(CostModel::new(0.0, 1.0).is_err());
        assert!(CostModel::new(f64::NAN, 0.0).is_err());
        assert!(CostModel::new(0.0005, 0.001).is_ok());
    }
}
