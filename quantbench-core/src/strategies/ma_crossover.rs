//! Moving Average Crossover strategy
//!
//! Classic trend-following entry/exit:
//! - Buy when the fast SMA crosses above the slow SMA and we are flat
//! - Sell the whole position when the fast SMA crosses back below

use crate::domain::Bar;
use crate::engine::{Signal, Strategy, StrategyContext};
use crate::error::ConfigError;
use crate::indicators::Sma;

const FAST_KEY: &str = "fast_sma";
const SLOW_KEY: &str = "slow_sma";

/// Moving Average Crossover strategy
///
/// # Parameters
/// - `fast_period`: Short SMA period (e.g., 10)
/// - `slow_period`: Long SMA period (e.g., 30)
///
/// Entries carry no quantity, so the engine's sizing rule decides.
#[derive(Debug, Clone)]
pub struct MaCrossover {
    fast_period: usize,
    slow_period: usize,
    name: String,
}

impl MaCrossover {
    pub fn new(fast_period: usize, slow_period: usize) -> Result<Self, ConfigError> {
        // validates both periods
        Sma::new(fast_period)?;
        Sma::new(slow_period)?;
        if fast_period >= slow_period {
            return Err(ConfigError::PeriodOrder {
                component: "MA crossover",
                fast: fast_period,
                slow: slow_period,
            });
        }
        Ok(Self {
            fast_period,
            slow_period,
            name: format!("ma_cross_{fast_period}_{slow_period}"),
        })
    }

    pub fn fast_period(&self) -> usize {
        self.fast_period
    }

    pub fn slow_period(&self) -> usize {
        self.slow_period
    }

    /// Some(true) on a bullish cross this bar, Some(false) on a bearish one.
    fn detect_cross(ctx: &StrategyContext) -> Option<bool> {
        let ind = ctx.indicators();
        let fast_now = ind.scalar(FAST_KEY)?;
        let slow_now = ind.scalar(SLOW_KEY)?;
        let fast_prev = ind.previous(FAST_KEY, 1)?.as_scalar()?;
        let slow_prev = ind.previous(SLOW_KEY, 1)?.as_scalar()?;

        if fast_prev <= slow_prev && fast_now > slow_now {
            Some(true)
        } else if fast_prev >= slow_prev && fast_now < slow_now {
            Some(false)
        } else {
            None
        }
    }
}

impl Strategy for MaCrossover {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self, ctx: &mut StrategyContext) -> Result<(), ConfigError> {
        let indicators = ctx.indicators_mut();
        indicators.add(FAST_KEY, Sma::new(self.fast_period)?);
        indicators.add(SLOW_KEY, Sma::new(self.slow_period)?);
        Ok(())
    }

    fn on_candle(&mut self, bar: &Bar, ctx: &StrategyContext) -> Vec<Signal> {
        let held = ctx.position(&bar.symbol).is_some();
        match Self::detect_cross(ctx) {
            Some(true) if !held => vec![Signal::buy(bar.symbol.clone())
                .with_reason("fast SMA crossed above slow SMA")],
            Some(false) if held => vec![Signal::sell(bar.symbol.clone())
                .with_reason("fast SMA crossed below slow SMA")],
            _ => Vec::new(),
        }
    }
}
