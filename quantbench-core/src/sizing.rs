//! Position sizing rules.
//!
//! Used when a strategy emits a buy signal without an explicit quantity.
//! Every rule returns 0.0 rather than a negative or non-finite size.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionSizing {
    /// Always trade N units.
    FixedQuantity { quantity: f64 },

    /// Always trade $X worth.
    FixedNotional { amount: f64 },

    /// Allocate a fraction of current equity.
    PercentOfEquity { fraction: f64 },

    /// Risk `risk_fraction` of equity, assuming a stop `stop_distance`
    /// (fraction of price) away from entry.
    RiskPerTrade {
        risk_fraction: f64,
        stop_distance: f64,
    },

    /// Fractional Kelly: f* = W - (1 - W) / R, scaled by `fraction`.
    Kelly {
        win_rate: f64,
        payoff_ratio: f64,
        fraction: f64,
    },
}

impl Default for PositionSizing {
    fn default() -> Self {
        PositionSizing::PercentOfEquity { fraction: 0.1 }
    }
}

impl PositionSizing {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |param: &'static str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::NonPositive {
                    component: "sizing",
                    param,
                    value: v,
                })
            }
        };
        match *self {
            PositionSizing::FixedQuantity { quantity } => positive("quantity", quantity),
            PositionSizing::FixedNotional { amount } => positive("amount", amount),
            PositionSizing::PercentOfEquity { fraction } => positive("fraction", fraction),
            PositionSizing::RiskPerTrade {
                risk_fraction,
                stop_distance,
            } => {
                positive("risk_fraction", risk_fraction)?;
                positive("stop_distance", stop_distance)
            }
            PositionSizing::Kelly {
                win_rate,
                payoff_ratio,
                fraction,
            } => {
                if !(0.0..=1.0).contains(&win_rate) {
                    return Err(ConfigError::OutOfRange {
                        field: "kelly.win_rate",
                        value: win_rate,
                        min: 0.0,
                        max: 1.0,
                    });
                }
                positive("payoff_ratio", payoff_ratio)?;
                positive("fraction", fraction)
            }
        }
    }

    /// Quantity to buy at `price` given current `equity`.
    pub fn quantity(&self, equity: f64, price: f64) -> f64 {
        if !(equity > 0.0 && price > 0.0) {
            return 0.0;
        }
        let qty = match *self {
            PositionSizing::FixedQuantity { quantity } => quantity,
            PositionSizing::FixedNotional { amount } => amount / price,
            PositionSizing::PercentOfEquity { fraction } => equity * fraction / price,
            PositionSizing::RiskPerTrade {
                risk_fraction,
                stop_distance,
            } => (equity * risk_fraction) / (price * stop_distance),
            PositionSizing::Kelly {
                win_rate,
                payoff_ratio,
                fraction,
            } => {
                let kelly = win_rate - (1.0 - win_rate) / payoff_ratio;
                kelly.max(0.0) * fraction * equity / price
            }
        };
        if qty.is_finite() && qty > 0.0 {
            qty
        } else {
            0.0
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::FixedQuantity { .. } => "FixedQuantity",
            Self::FixedNotional { .. } => "FixedNotional",
            Self::PercentOfEquity { .. } => "PercentOfEquity",
            Self::RiskPerTrade { .. } => "RiskPerTrade",
            Self::Kelly { .. } => "Kelly",
        }
    }
}
