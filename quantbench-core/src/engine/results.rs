//! Run output: trades, orders, equity curve and a summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Order, Trade};
use crate::ledger::PortfolioSnapshot;

/// Portfolio value recorded after a bar (or after the closing phase).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
    pub cash: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub strategy: String,
    pub symbol: String,
    pub initial_capital: f64,
    pub final_equity: f64,
    /// (final − initial) / initial.
    pub total_return: f64,
    pub realized_pnl: f64,
    pub total_commission: f64,
    pub total_slippage: f64,
    pub bars_processed: usize,
    pub orders_submitted: usize,
    pub orders_rejected: usize,
    pub trades_executed: usize,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Market time covered by the processed bars.
    pub duration_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResults {
    pub trades: Vec<Trade>,
    pub orders: Vec<Order>,
    pub equity_curve: Vec<EquityPoint>,
    pub final_portfolio: PortfolioSnapshot,
    pub summary: BacktestSummary,
}

impl BacktestResults {
    /// Equity values only, in order.
    pub fn equity_values(&self) -> Vec<f64> {
        self.equity_curve.iter().map(|p| p.equity).collect()
    }

    pub fn rejected_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter().filter(|o| !o.is_filled())
    }

    /// Trades that closed (part of) a position.
    pub fn closing_trades(&self) -> impl Iterator<Item = &Trade> {
        self.trades.iter().filter(|t| t.is_closing())
    }
}
