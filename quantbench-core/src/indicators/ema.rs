//! Exponential Moving Average (EMA).
//!
//! k = 2 / (period + 1). Seeded with the SMA of the first `period` prices,
//! then ema = price * k + prev * (1 - k).
//! Required candles: period.

use super::rolling::{EmaState, History};
use super::{check_period, record, Indicator};
use crate::domain::{Bar, PriceSource};
use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    source: PriceSource,
    name: String,
    state: EmaState,
    history: History<f64>,
}

impl Ema {
    pub fn new(period: usize) -> Result<Self, ConfigError> {
        Self::with_source(period, PriceSource::Close)
    }

    pub fn with_source(period: usize, source: PriceSource) -> Result<Self, ConfigError> {
        let period = check_period("EMA", "period", period)?;
        Ok(Self {
            period,
            source,
            name: format!("ema_{period}"),
            state: EmaState::new(period),
            history: History::default(),
        })
    }
}

impl Indicator for Ema {
    type Output = f64;

    fn name(&self) -> &str {
        &self.name
    }

    fn required_candles(&self) -> usize {
        self.period
    }

    fn update(&mut self, bar: &Bar) -> Option<f64> {
        let value = self.state.next(bar.price(self.source));
        record(&mut self.history, value)
    }

    fn reset(&mut self) {
        self.state.reset();
        self.history.clear();
    }

    fn history(&self) -> &History<f64> {
        &self.history
    }

    fn history_mut(&mut self) -> &mut History<f64> {
        &mut self.history
    }
}
