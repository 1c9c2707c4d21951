//! On-Balance Volume (OBV).
//!
//! Cumulative signed volume: +volume when close > prev close, -volume when
//! lower, unchanged otherwise. The series starts at bar 1, seeded from the
//! bar 0 → bar 1 comparison (0 ± volume of bar 1).
//! Required candles: 2.

use super::rolling::History;
use super::{record, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone, Default)]
pub struct Obv {
    prev_close: Option<f64>,
    total: f64,
    history: History<f64>,
}

impl Obv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Indicator for Obv {
    type Output = f64;

    fn name(&self) -> &str {
        "obv"
    }

    fn required_candles(&self) -> usize {
        2
    }

    fn update(&mut self, bar: &Bar) -> Option<f64> {
        let value = self.prev_close.replace(bar.close).map(|prev| {
            if bar.close > prev {
                self.total += bar.volume;
            } else if bar.close < prev {
                self.total -= bar.volume;
            }
            self.total
        });
        record(&mut self.history, value)
    }

    fn reset(&mut self) {
        self.prev_close = None;
        self.total = 0.0;
        self.history.clear();
    }

    fn history(&self) -> &History<f64> {
        &self.history
    }

    fn history_mut(&mut self) -> &mut History<f64> {
        &mut self.history
    }
}
