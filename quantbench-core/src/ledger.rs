//! Portfolio ledger — the single source of truth for cash, positions and P&L.
//!
//! Mutated only by [`Ledger::apply_trade`] and [`Ledger::mark_price`]. After
//! every mutation `equity == cash + Σ(signed qty · mark)`,
//! `total_pnl == realized_pnl + unrealized_pnl`, and cash reconciles against
//! realized P&L and open cost basis.
//!
//! The ledger books long positions: buys open or grow them, sells reduce or
//! close them. It never clamps a sell to what is held; callers validate
//! first and a bad trade comes back as a [`LedgerError`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{OrderSide, Position, PositionSide, Trade};
use crate::error::LedgerError;

/// Quantities at or below this are treated as flat.
pub const QUANTITY_EPSILON: f64 = 1e-9;

/// Net realized P&L of selling `quantity` at `fill_price` against a long
/// entered at `entry_price`.
pub fn realized_pnl(entry_price: f64, fill_price: f64, quantity: f64, commission: f64) -> f64 {
    (fill_price - entry_price) * quantity - commission
}

/// What a trade did to the position in its symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PositionTransition {
    Opened,
    Increased,
    Reduced { realized_pnl: f64 },
    Closed { realized_pnl: f64 },
}

/// Read-only copy of the ledger handed to strategies and validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub cash: f64,
    pub equity: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub total_pnl: f64,
    pub total_commission: f64,
    pub total_slippage: f64,
    pub peak_equity: f64,
    pub positions: BTreeMap<String, Position>,
}

impl PortfolioSnapshot {
    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn open_positions(&self) -> usize {
        self.positions.len()
    }

    /// Gross notional of all open positions at their marks.
    pub fn gross_exposure(&self) -> f64 {
        self.positions.values().map(Position::notional).sum()
    }

    /// Gross exposure as a fraction of equity.
    pub fn exposure(&self) -> f64 {
        if self.equity <= 0.0 {
            return 0.0;
        }
        self.gross_exposure() / self.equity
    }

    /// Fractional decline of equity from its peak, in [0, 1] for
    /// non-negative equity.
    pub fn drawdown(&self) -> f64 {
        if self.peak_equity <= 0.0 {
            return 0.0;
        }
        ((self.peak_equity - self.equity) / self.peak_equity).max(0.0)
    }
}

#[derive(Debug, Clone)]
pub struct Ledger {
    initial_capital: f64,
    cash: f64,
    positions: BTreeMap<String, Position>,
    realized_pnl: f64,
    total_commission: f64,
    entry_commission: f64,
    total_slippage: f64,
    peak_equity: f64,
}

impl Ledger {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            initial_capital,
            cash: initial_capital,
            positions: BTreeMap::new(),
            realized_pnl: 0.0,
            total_commission: 0.0,
            entry_commission: 0.0,
            total_slippage: 0.0,
            peak_equity: initial_capital,
        }
    }

    /// Book a fill. Buys debit `qty·price + commission`, sells credit
    /// `qty·price − commission`.
    pub fn apply_trade(&mut self, trade: &Trade) -> Result<PositionTransition, LedgerError> {
        if !(trade.quantity.is_finite() && trade.quantity > 0.0) {
            return Err(LedgerError::InvalidQuantity(trade.quantity));
        }
        if !(trade.price.is_finite() && trade.price > 0.0) {
            return Err(LedgerError::InvalidPrice(trade.price));
        }

        let transition = match trade.side {
            OrderSide::Buy => self.apply_buy(trade),
            OrderSide::Sell => self.apply_sell(trade)?,
        };

        self.total_commission += trade.commission;
        self.total_slippage += trade.slippage;
        self.refresh_peak();
        self.debug_check();
        Ok(transition)
    }

    fn apply_buy(&mut self, trade: &Trade) -> PositionTransition {
        self.cash -= trade.quantity * trade.price + trade.commission;
        self.entry_commission += trade.commission;
        match self.positions.get_mut(&trade.symbol) {
            Some(pos) => {
                let new_qty = pos.quantity + trade.quantity;
                pos.entry_price =
                    (pos.quantity * pos.entry_price + trade.quantity * trade.price) / new_qty;
                pos.quantity = new_qty;
                pos.mark(trade.price);
                PositionTransition::Increased
            }
            None => {
                let pos = Position::open(
                    trade.symbol.clone(),
                    PositionSide::Long,
                    trade.quantity,
                    trade.price,
                    trade.timestamp,
                );
                self.positions.insert(trade.symbol.clone(), pos);
                PositionTransition::Opened
            }
        }
    }

    fn apply_sell(&mut self, trade: &Trade) -> Result<PositionTransition, LedgerError> {
        let pos = self
            .positions
            .get_mut(&trade.symbol)
            .ok_or_else(|| LedgerError::NoPosition(trade.symbol.clone()))?;
        if trade.quantity > pos.quantity + QUANTITY_EPSILON {
            return Err(LedgerError::InsufficientPosition {
                symbol: trade.symbol.clone(),
                requested: trade.quantity,
                held: pos.quantity,
            });
        }

        let pnl = realized_pnl(pos.entry_price, trade.price, trade.quantity, trade.commission);
        self.cash += trade.quantity * trade.price - trade.commission;
        self.realized_pnl += pnl;
        pos.realized_pnl += pnl;
        pos.quantity -= trade.quantity;

        if pos.quantity <= QUANTITY_EPSILON {
            self.positions.remove(&trade.symbol);
            Ok(PositionTransition::Closed { realized_pnl: pnl })
        } else {
            pos.mark(trade.price);
            Ok(PositionTransition::Reduced { realized_pnl: pnl })
        }
    }

    /// Update the mark of the position in `symbol`. Returns false when no
    /// position is open there.
    pub fn mark_price(&mut self, symbol: &str, price: f64) -> bool {
        let marked = match self.positions.get_mut(symbol) {
            Some(pos) => {
                pos.mark(price);
                true
            }
            None => false,
        };
        if marked {
            self.refresh_peak();
            self.debug_check();
        }
        marked
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn equity(&self) -> f64 {
        self.cash + self.positions.values().map(Position::market_value).sum::<f64>()
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    pub fn unrealized_pnl(&self) -> f64 {
        self.positions.values().map(|p| p.unrealized_pnl).sum()
    }

    pub fn total_pnl(&self) -> f64 {
        self.realized_pnl + self.unrealized_pnl()
    }

    pub fn total_commission(&self) -> f64 {
        self.total_commission
    }

    pub fn total_slippage(&self) -> f64 {
        self.total_slippage
    }

    pub fn peak_equity(&self) -> f64 {
        self.peak_equity
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn open_positions(&self) -> usize {
        self.positions.len()
    }

    /// Earliest open timestamp among current positions.
    pub fn oldest_position(&self) -> Option<DateTime<Utc>> {
        self.positions.values().map(|p| p.opened_at).min()
    }

    pub fn snapshot(&self) -> PortfolioSnapshot {
        let unrealized = self.unrealized_pnl();
        PortfolioSnapshot {
            cash: self.cash,
            equity: self.equity(),
            realized_pnl: self.realized_pnl,
            unrealized_pnl: unrealized,
            total_pnl: self.realized_pnl + unrealized,
            total_commission: self.total_commission,
            total_slippage: self.total_slippage,
            peak_equity: self.peak_equity,
            positions: self.positions.clone(),
        }
    }

    fn refresh_peak(&mut self) {
        let equity = self.equity();
        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
    }

    /// Panics in debug builds if an accounting identity is broken.
    ///
    /// Sells release `qty·entry` of cost basis plus their realized P&L, so
    /// `cash == initial + realized − Σ(qty·entry) − buy commissions`.
    fn debug_check(&self) {
        #[cfg(debug_assertions)]
        {
            for pos in self.positions.values() {
                assert!(
                    pos.quantity > QUANTITY_EPSILON,
                    "open position {} has non-positive quantity {}",
                    pos.symbol,
                    pos.quantity
                );
            }
            let cost_basis: f64 = self
                .positions
                .values()
                .map(|p| p.quantity * p.entry_price)
                .sum();
            let expected =
                self.initial_capital + self.realized_pnl - cost_basis - self.entry_commission;
            let scale = self.initial_capital.abs().max(cost_basis).max(1.0);
            assert!(
                (self.cash - expected).abs() <= 1e-9 * scale,
                "cash accounting violated: cash={}, expected={expected}",
                self.cash
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderId, TradeId};
    use chrono::TimeZone;

    fn trade(side: OrderSide, quantity: f64, price: f64, commission: f64) -> Trade {
        Trade {
            id: TradeId(1),
            order_id: OrderId(1),
            symbol: "SPY".into(),
            side,
            quantity,
            price,
            commission,
            slippage: 0.0,
            realized_pnl: None,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        }
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn buy_opens_position_and_debits_cash() {
        let mut ledger = Ledger::new(10_000.0);
        let t = ledger.apply_trade(&trade(OrderSide::Buy, 10.0, 100.0, 1.0)).unwrap();
        assert_eq!(t, PositionTransition::Opened);
        assert_close(ledger.cash(), 10_000.0 - 1000.0 - 1.0);
        assert_close(ledger.equity(), 9_999.0);
        let pos = ledger.position("SPY").unwrap();
        assert_eq!(pos.quantity, 10.0);
        assert_eq!(pos.entry_price, 100.0);
    }

    #[test]
    fn adding_uses_volume_weighted_entry() {
        let mut ledger = Ledger::new(10_000.0);
        ledger.apply_trade(&trade(OrderSide::Buy, 10.0, 100.0, 0.0)).unwrap();
        let t = ledger.apply_trade(&trade(OrderSide::Buy, 30.0, 120.0, 0.0)).unwrap();
        assert_eq!(t, PositionTransition::Increased);
        // (10*100 + 30*120) / 40 = 115
        assert_close(ledger.position("SPY").unwrap().entry_price, 115.0);
    }

    #[test]
    fn partial_sell_realizes_pnl_net_of_commission() {
        let mut ledger = Ledger::new(10_000.0);
        ledger.apply_trade(&trade(OrderSide::Buy, 10.0, 100.0, 0.0)).unwrap();
        let t = ledger.apply_trade(&trade(OrderSide::Sell, 4.0, 110.0, 2.0)).unwrap();
        // (110 - 100) * 4 - 2 = 38
        assert_eq!(t, PositionTransition::Reduced { realized_pnl: 38.0 });
        assert_close(ledger.realized_pnl(), 38.0);
        let pos = ledger.position("SPY").unwrap();
        assert_close(pos.quantity, 6.0);
        assert_close(pos.unrealized_pnl, 60.0);
        assert_close(ledger.total_pnl(), 98.0);
    }

    #[test]
    fn full_close_removes_position() {
        let mut ledger = Ledger::new(10_000.0);
        ledger.apply_trade(&trade(OrderSide::Buy, 10.0, 100.0, 0.0)).unwrap();
        let t = ledger.apply_trade(&trade(OrderSide::Sell, 10.0, 90.0, 0.0)).unwrap();
        assert_eq!(t, PositionTransition::Closed { realized_pnl: -100.0 });
        assert!(ledger.position("SPY").is_none());
        assert_eq!(ledger.open_positions(), 0);
        assert_close(ledger.equity(), 9_900.0);
    }

    #[test]
    fn reopen_after_close_starts_fresh_entry() {
        let mut ledger = Ledger::new(10_000.0);
        ledger.apply_trade(&trade(OrderSide::Buy, 10.0, 100.0, 0.0)).unwrap();
        ledger.apply_trade(&trade(OrderSide::Sell, 10.0, 105.0, 0.0)).unwrap();
        ledger.apply_trade(&trade(OrderSide::Buy, 3.0, 80.0, 0.0)).unwrap();
        let pos = ledger.position("SPY").unwrap();
        assert_eq!(pos.entry_price, 80.0);
        assert_eq!(pos.realized_pnl, 0.0);
    }

    #[test]
    fn selling_unheld_symbol_is_an_error() {
        let mut ledger = Ledger::new(10_000.0);
        let err = ledger
            .apply_trade(&trade(OrderSide::Sell, 1.0, 100.0, 0.0))
            .unwrap_err();
        assert_eq!(err, LedgerError::NoPosition("SPY".into()));
        assert_eq!(ledger.cash(), 10_000.0);
    }

    #[test]
    fn overselling_is_not_clamped() {
        let mut ledger = Ledger::new(10_000.0);
        ledger.apply_trade(&trade(OrderSide::Buy, 5.0, 100.0, 0.0)).unwrap();
        let err = ledger
            .apply_trade(&trade(OrderSide::Sell, 6.0, 100.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientPosition { .. }));
        assert_eq!(ledger.position("SPY").unwrap().quantity, 5.0);
    }

    #[test]
    fn invalid_trade_values_rejected() {
        let mut ledger = Ledger::new(10_000.0);
        assert!(ledger.apply_trade(&trade(OrderSide::Buy, 0.0, 100.0, 0.0)).is_err());
        assert!(ledger.apply_trade(&trade(OrderSide::Buy, 1.0, f64::NAN, 0.0)).is_err());
    }

    #[test]
    fn mark_price_updates_unrealized_and_peak() {
        let mut ledger = Ledger::new(1_000.0);
        ledger.apply_trade(&trade(OrderSide::Buy, 5.0, 100.0, 0.0)).unwrap();
        assert!(ledger.mark_price("SPY", 120.0));
        assert_close(ledger.unrealized_pnl(), 100.0);
        assert_close(ledger.peak_equity(), 1_100.0);
        assert!(ledger.mark_price("SPY", 90.0));
        let snap = ledger.snapshot();
        assert_close(snap.equity, 950.0);
        assert_close(snap.drawdown(), 150.0 / 1_100.0);
        assert!(!ledger.mark_price("QQQ", 1.0));
    }

    #[test]
    fn snapshot_exposure() {
        let mut ledger = Ledger::new(1_000.0);
        ledger.apply_trade(&trade(OrderSide::Buy, 5.0, 100.0, 0.0)).unwrap();
        let snap = ledger.snapshot();
        assert_close(snap.gross_exposure(), 500.0);
        assert_close(snap.exposure(), 0.5);
        assert!(snap.has_position("SPY"));
        assert_close(snap.total_pnl, snap.realized_pnl + snap.unrealized_pnl);
    }
}
