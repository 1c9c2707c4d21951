//! Moving Average Convergence Divergence (MACD).
//!
//! line = EMA(fast) - EMA(slow); signal = EMA(signal_period) of the line;
//! histogram = line - signal.
//!
//! Degenerate state: once the line exists but the signal EMA has not yet
//! seen `signal_period` line values, `signal` equals the line and the
//! histogram is 0. Strategies may rely on this value.
//! Required candles: slow.

use serde::{Deserialize, Serialize};

use super::rolling::{EmaState, History};
use super::{check_period, record, Indicator};
use crate::domain::{Bar, PriceSource};
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdValue {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone)]
pub struct Macd {
    slow_period: usize,
    source: PriceSource,
    name: String,
    fast: EmaState,
    slow: EmaState,
    signal: EmaState,
    history: History<MacdValue>,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Result<Self, ConfigError> {
        let fast = check_period("MACD", "fast", fast)?;
        let slow = check_period("MACD", "slow", slow)?;
        let signal = check_period("MACD", "signal", signal)?;
        if fast >= slow {
            return Err(ConfigError::PeriodOrder {
                component: "MACD",
                fast,
                slow,
            });
        }
        Ok(Self {
            slow_period: slow,
            source: PriceSource::Close,
            name: format!("macd_{fast}_{slow}_{signal}"),
            fast: EmaState::new(fast),
            slow: EmaState::new(slow),
            signal: EmaState::new(signal),
            history: History::default(),
        })
    }

    pub fn with_source(mut self, source: PriceSource) -> Self {
        self.source = source;
        self
    }
}

impl Indicator for Macd {
    type Output = MacdValue;

    fn name(&self) -> &str {
        &self.name
    }

    fn required_candles(&self) -> usize {
        self.slow_period
    }

    fn update(&mut self, bar: &Bar) -> Option<MacdValue> {
        let price = bar.price(self.source);
        // Both EMAs must see every bar, even before the slow one is seeded.
        let fast = self.fast.next(price);
        let slow = self.slow.next(price);
        let value = match (fast, slow) {
            (Some(f), Some(s)) => {
                let macd = f - s;
                let signal = self.signal.next(macd).unwrap_or(macd);
                Some(MacdValue {
                    macd,
                    signal,
                    histogram: macd - signal,
                })
            }
            _ => None,
        };
        record(&mut self.history, value)
    }

    fn reset(&mut self) {
        self.fast.reset();
        self.slow.reset();
        self.signal.reset();
        self.history.clear();
    }

    fn history(&self) -> &History<MacdValue> {
        &self.history
    }

    fn history_mut(&mut self) -> &mut History<MacdValue> {
        &mut self.history
    }
}
