//! Stochastic oscillator.
//!
//! raw %K = 100 · (close - lowest_low) / (highest_high - lowest_low) over
//! `k_period` bars, 50 when the range is zero. %K is raw %K smoothed by an
//! SMA of `smooth_k` (1 = unsmoothed). %D = SMA(`d_period`) of %K.
//!
//! Degenerate state: until %D has `d_period` inputs it equals %K, mirroring
//! the MACD signal policy.
//! Required candles: k_period + smooth_k - 1.

use serde::{Deserialize, Serialize};

use super::rolling::{History, MeanWindow, RollingWindow};
use super::{check_period, record, Indicator};
use crate::domain::Bar;
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochasticValue {
    pub k: f64,
    pub d: f64,
}

#[derive(Debug, Clone)]
pub struct Stochastic {
    k_period: usize,
    smooth_k: usize,
    name: String,
    /// (high, low) of the last `k_period` bars.
    range: RollingWindow<(f64, f64)>,
    k_smoother: MeanWindow,
    d_smoother: MeanWindow,
    history: History<StochasticValue>,
}

impl Stochastic {
    pub fn new(k_period: usize, d_period: usize, smooth_k: usize) -> Result<Self, ConfigError> {
        let k_period = check_period("Stochastic", "k_period", k_period)?;
        let d_period = check_period("Stochastic", "d_period", d_period)?;
        let smooth_k = check_period("Stochastic", "smooth_k", smooth_k)?;
        Ok(Self {
            k_period,
            smooth_k,
            name: format!("stoch_{k_period}_{d_period}_{smooth_k}"),
            range: RollingWindow::new(k_period),
            k_smoother: MeanWindow::new(smooth_k),
            d_smoother: MeanWindow::new(d_period),
            history: History::default(),
        })
    }

    fn raw_k(&self, close: f64) -> f64 {
        let (hh, ll) = self
            .range
            .iter()
            .fold((f64::NEG_INFINITY, f64::INFINITY), |(hh, ll), &(h, l)| {
                (hh.max(h), ll.min(l))
            });
        let span = hh - ll;
        if span == 0.0 {
            50.0
        } else {
            100.0 * (close - ll) / span
        }
    }
}

impl Indicator for Stochastic {
    type Output = StochasticValue;

    fn name(&self) -> &str {
        &self.name
    }

    fn required_candles(&self) -> usize {
        self.k_period + self.smooth_k - 1
    }

    fn update(&mut self, bar: &Bar) -> Option<StochasticValue> {
        self.range.push((bar.high, bar.low));
        let value = if self.range.is_full() {
            let raw = self.raw_k(bar.close);
            self.k_smoother.next(raw).map(|k| {
                let d = self.d_smoother.next(k).unwrap_or(k);
                StochasticValue { k, d }
            })
        } else {
            None
        };
        record(&mut self.history, value)
    }

    fn reset(&mut self) {
        self.range.clear();
        self.k_smoother.reset();
        self.d_smoother.reset();
        self.history.clear();
    }

    fn history(&self) -> &History<StochasticValue> {
        &self.history
    }

    fn history_mut(&mut self) -> &mut History<StochasticValue> {
        &mut self.history
    }
}
