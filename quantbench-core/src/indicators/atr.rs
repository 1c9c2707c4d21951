//! Average True Range (ATR) — Wilder smoothing.
//!
//! TR = max(high - low, |high - prev_close|, |low - prev_close|).
//! The first bar has no previous close and contributes no TR.
//! First ATR = mean of the first `period` TRs; then
//! atr = (prev * (period - 1) + tr) / period.
//! Required candles: period + 1.

use super::rolling::{History, WilderState};
use super::{check_period, record, Indicator};
use crate::domain::Bar;
use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
    prev_close: Option<f64>,
    smoother: WilderState,
    history: History<f64>,
}

impl Atr {
    pub fn new(period: usize) -> Result<Self, ConfigError> {
        let period = check_period("ATR", "period", period)?;
        Ok(Self {
            period,
            name: format!("atr_{period}"),
            prev_close: None,
            smoother: WilderState::new(period),
            history: History::default(),
        })
    }
}

/// True range of `bar` given the previous close.
pub fn true_range(bar: &Bar, prev_close: f64) -> f64 {
    let hl = bar.high - bar.low;
    let hc = (bar.high - prev_close).abs();
    let lc = (bar.low - prev_close).abs();
    hl.max(hc).max(lc)
}

impl Indicator for Atr {
    type Output = f64;

    fn name(&self) -> &str {
        &self.name
    }

    fn required_candles(&self) -> usize {
        self.period + 1
    }

    fn update(&mut self, bar: &Bar) -> Option<f64> {
        let value = match self.prev_close.replace(bar.close) {
            Some(prev) => self.smoother.next(true_range(bar, prev)),
            None => None,
        };
        record(&mut self.history, value)
    }

    fn reset(&mut self) {
        self.prev_close = None;
        self.smoother.reset();
        self.history.clear();
    }

    fn history(&self) -> &History<f64> {
        &self.history
    }

    fn history_mut(&mut self) -> &mut History<f64> {
        &mut self.history
    }
}
