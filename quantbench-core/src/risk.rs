//! Order validation against ledger invariants and risk limits.
//!
//! Pure functions over a [`PortfolioSnapshot`]. A failed check is a
//! [`Rejection`] value, never a panic.

use serde::{Deserialize, Serialize};

use crate::domain::{OrderRequest, OrderSide};
use crate::error::{ConfigError, Rejection};
use crate::ledger::{PortfolioSnapshot, QUANTITY_EPSILON};

/// Portfolio-level limits checked before any position-increasing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskLimits {
    /// Maximum number of simultaneously open positions.
    pub max_positions: usize,
    /// Largest single position, as a fraction of equity.
    pub max_position_size: f64,
    /// Smallest order notional accepted.
    pub min_position_size: f64,
    /// Ceiling on gross exposure / equity after the order.
    pub max_portfolio_risk: f64,
    /// New positions are refused once drawdown from peak reaches this fraction.
    pub max_drawdown: f64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_positions: 10,
            max_position_size: 1.0,
            min_position_size: 0.0,
            max_portfolio_risk: 1.0,
            max_drawdown: 1.0,
        }
    }
}

impl RiskLimits {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_positions == 0 {
            return Err(ConfigError::RiskLimits("max_positions must be >= 1".into()));
        }
        let fractions = [
            ("max_position_size", self.max_position_size),
            ("max_portfolio_risk", self.max_portfolio_risk),
        ];
        for (name, v) in fractions {
            if !(v.is_finite() && v > 0.0) {
                return Err(ConfigError::RiskLimits(format!(
                    "{name} must be positive, got {v}"
                )));
            }
        }
        if !(self.max_drawdown > 0.0 && self.max_drawdown <= 1.0) {
            return Err(ConfigError::RiskLimits(format!(
                "max_drawdown must be in (0, 1], got {}",
                self.max_drawdown
            )));
        }
        if !(self.min_position_size.is_finite() && self.min_position_size >= 0.0) {
            return Err(ConfigError::RiskLimits(format!(
                "min_position_size must be >= 0, got {}",
                self.min_position_size
            )));
        }
        Ok(())
    }
}

/// Expected execution of an order, computed before it is accepted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillQuote {
    pub price: f64,
    pub commission: f64,
    /// Dollar slippage cost versus the reference price.
    pub slippage: f64,
}

/// Checks that keep the ledger consistent: finite positive values, cash for
/// buys, a sufficiently large held position for sells.
pub fn check_ledger(
    request: &OrderRequest,
    quote: &FillQuote,
    portfolio: &PortfolioSnapshot,
) -> Result<(), Rejection> {
    if !(request.quantity.is_finite() && request.quantity > 0.0) {
        return Err(Rejection::InvalidQuantity(request.quantity));
    }
    if !(quote.price.is_finite() && quote.price > 0.0) {
        return Err(Rejection::InvalidPrice(quote.price));
    }
    match request.side {
        OrderSide::Buy => {
            let required = request.quantity * quote.price + quote.commission;
            if required > portfolio.cash {
                return Err(Rejection::InsufficientCash {
                    required,
                    available: portfolio.cash,
                });
            }
        }
        OrderSide::Sell => {
            let held = portfolio
                .position(&request.symbol)
                .map(|p| p.quantity)
                .ok_or_else(|| Rejection::NoPosition(request.symbol.clone()))?;
            if request.quantity > held + QUANTITY_EPSILON {
                return Err(Rejection::InsufficientPosition {
                    symbol: request.symbol.clone(),
                    requested: request.quantity,
                    held,
                });
            }
        }
    }
    Ok(())
}

/// Risk-limit checks. Sells only reduce risk and always pass.
pub fn check_limits(
    request: &OrderRequest,
    quote: &FillQuote,
    portfolio: &PortfolioSnapshot,
    limits: &RiskLimits,
) -> Result<(), Rejection> {
    if request.side == OrderSide::Sell {
        return Ok(());
    }

    let drawdown = portfolio.drawdown();
    if drawdown >= limits.max_drawdown {
        return Err(Rejection::DrawdownCeiling {
            drawdown,
            limit: limits.max_drawdown,
        });
    }

    let existing = portfolio.position(&request.symbol);
    if existing.is_none() && portfolio.open_positions() >= limits.max_positions {
        return Err(Rejection::MaxPositions(limits.max_positions));
    }

    let notional = request.quantity * quote.price;
    if notional < limits.min_position_size {
        return Err(Rejection::PositionTooSmall {
            value: notional,
            min: limits.min_position_size,
        });
    }

    let equity = portfolio.equity;
    let position_value = existing.map_or(0.0, |p| p.notional()) + notional;
    let position_limit = limits.max_position_size * equity;
    if position_value > position_limit {
        return Err(Rejection::PositionTooLarge {
            value: position_value,
            limit: position_limit,
        });
    }

    let exposure = if equity > 0.0 {
        (portfolio.gross_exposure() + notional) / equity
    } else {
        f64::INFINITY
    };
    if exposure > limits.max_portfolio_risk {
        return Err(Rejection::PortfolioRisk {
            exposure,
            limit: limits.max_portfolio_risk,
        });
    }

    Ok(())
}

/// Full validation used by the backtest loop. Exits skip the risk limits
/// but never the ledger checks.
pub fn validate_order(
    request: &OrderRequest,
    quote: &FillQuote,
    portfolio: &PortfolioSnapshot,
    limits: &RiskLimits,
    is_exit: bool,
) -> Result<(), Rejection> {
    check_ledger(request, quote, portfolio)?;
    if !is_exit {
        check_limits(request, quote, portfolio, limits)?;
    }
    Ok(())
}
