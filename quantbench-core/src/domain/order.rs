//! Orders — requests to trade, recorded once with a terminal status.
//!
//! In backtest mode there is no working order book: every order is either
//! filled in full on the bar it was submitted or rejected outright.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{OrderId, TradeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// +1 for buys, -1 for sells.
    pub fn sign(&self) -> f64 {
        match self {
            OrderSide::Buy => 1.0,
            OrderSide::Sell => -1.0,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => f.write_str("BUY"),
            OrderSide::Sell => f.write_str("SELL"),
        }
    }
}

/// An order awaiting validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: f64,
    pub limit_price: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Terminal order state. There is no pending state in backtest mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OrderStatus {
    Filled { trade_id: TradeId },
    Rejected { reason: String },
}

/// Immutable record of a submitted order and how it ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: f64,
    pub limit_price: Option<f64>,
    pub timestamp: DateTime<Utc>,
    pub status: OrderStatus,
}

impl Order {
    pub fn filled(id: OrderId, request: OrderRequest, trade_id: TradeId) -> Self {
        Self::from_request(id, request, OrderStatus::Filled { trade_id })
    }

    pub fn rejected(id: OrderId, request: OrderRequest, reason: impl Into<String>) -> Self {
        Self::from_request(
            id,
            request,
            OrderStatus::Rejected {
                reason: reason.into(),
            },
        )
    }

    fn from_request(id: OrderId, request: OrderRequest, status: OrderStatus) -> Self {
        Self {
            id,
            symbol: request.symbol,
            side: request.side,
            quantity: request.quantity,
            limit_price: request.limit_price,
            timestamp: request.timestamp,
            status,
        }
    }

    pub fn is_filled(&self) -> bool {
        matches!(self.status, OrderStatus::Filled { .. })
    }
}
