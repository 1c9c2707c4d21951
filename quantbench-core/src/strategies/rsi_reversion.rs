//! RSI mean-reversion strategy
//!
//! - Buy when RSI drops below `oversold` and we are flat
//! - Sell the whole position when RSI rises above `overbought`

use crate::domain::Bar;
use crate::engine::{Signal, Strategy, StrategyContext};
use crate::error::ConfigError;
use crate::indicators::Rsi;

const RSI_KEY: &str = "rsi";

#[derive(Debug, Clone)]
pub struct RsiReversion {
    period: usize,
    oversold: f64,
    overbought: f64,
    name: String,
}

impl RsiReversion {
    pub fn new(period: usize, oversold: f64, overbought: f64) -> Result<Self, ConfigError> {
        Rsi::new(period)?;
        if !(oversold > 0.0 && oversold < 100.0) {
            return Err(ConfigError::OutOfRange {
                field: "rsi_reversion.oversold",
                value: oversold,
                min: 0.0,
                max: 100.0,
            });
        }
        if !(overbought > oversold && overbought < 100.0) {
            return Err(ConfigError::OutOfRange {
                field: "rsi_reversion.overbought",
                value: overbought,
                min: oversold,
                max: 100.0,
            });
        }
        Ok(Self {
            period,
            oversold,
            overbought,
            name: format!("rsi_reversion_{period}"),
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn thresholds(&self) -> (f64, f64) {
        (self.oversold, self.overbought)
    }
}

impl Strategy for RsiReversion {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self, ctx: &mut StrategyContext) -> Result<(), ConfigError> {
        ctx.indicators_mut().add(RSI_KEY, Rsi::new(self.period)?);
        Ok(())
    }

    fn on_candle(&mut self, bar: &Bar, ctx: &StrategyContext) -> Vec<Signal> {
        let Some(rsi) = ctx.indicators().scalar(RSI_KEY) else {
            return Vec::new();
        };
        let held = ctx.position(&bar.symbol).is_some();

        if !held && rsi < self.oversold {
            vec![Signal::buy(bar.symbol.clone()).with_reason(format!("RSI {rsi:.1} oversold"))]
        } else if held && rsi > self.overbought {
            vec![Signal::sell(bar.symbol.clone()).with_reason(format!("RSI {rsi:.1} overbought"))]
        } else {
            Vec::new()
        }
    }
}
