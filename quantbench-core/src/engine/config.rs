//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::execution::CostModel;
use crate::indicators::DEFAULT_HISTORY_LIMIT;
use crate::risk::RiskLimits;
use crate::sizing::PositionSizing;

/// Configuration for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub initial_capital: f64,
    /// Fractional slippage applied against the trader on every fill.
    pub slippage: f64,
    /// Commission as a fraction of fill notional.
    pub commission_rate: f64,
    pub risk_limits: RiskLimits,
    /// Sizing rule for buy signals that carry no quantity.
    pub sizing: PositionSizing,
    /// Bars kept in the strategy context and values kept per indicator.
    pub history_limit: usize,
}

impl EngineConfig {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            initial_capital,
            slippage: 0.0,
            commission_rate: 0.0,
            risk_limits: RiskLimits::default(),
            sizing: PositionSizing::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_costs(mut self, slippage: f64, commission_rate: f64) -> Self {
        self.slippage = slippage;
        self.commission_rate = commission_rate;
        self
    }

    pub fn with_risk_limits(mut self, limits: RiskLimits) -> Self {
        self.risk_limits = limits;
        self
    }

    pub fn with_sizing(mut self, sizing: PositionSizing) -> Self {
        self.sizing = sizing;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn cost_model(&self) -> Result<CostModel, ConfigError> {
        CostModel::new(self.slippage, self.commission_rate)
    }

    /// Reject anything that would make the run meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(ConfigError::InvalidCapital(self.initial_capital));
        }
        self.cost_model()?;
        self.risk_limits.validate()?;
        self.sizing.validate()?;
        if self.history_limit == 0 {
            return Err(ConfigError::ZeroPeriod {
                component: "engine",
                param: "history_limit",
                value: 0,
            });
        }
        Ok(())
    }
}
