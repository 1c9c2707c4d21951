//! Simple Moving Average (SMA).
//!
//! Arithmetic mean of the last `period` prices from the configured source.
//! Required candles: period.

use super::rolling::{History, MeanWindow};
use super::{check_period, record, Indicator};
use crate::domain::{Bar, PriceSource};
use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    source: PriceSource,
    name: String,
    window: MeanWindow,
    history: History<f64>,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, ConfigError> {
        Self::with_source(period, PriceSource::Close)
    }

    pub fn with_source(period: usize, source: PriceSource) -> Result<Self, ConfigError> {
        let period = check_period("SMA", "period", period)?;
        Ok(Self {
            period,
            source,
            name: format!("sma_{period}"),
            window: MeanWindow::new(period),
            history: History::default(),
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    type Output = f64;

    fn name(&self) -> &str {
        &self.name
    }

    fn required_candles(&self) -> usize {
        self.period
    }

    fn update(&mut self, bar: &Bar) -> Option<f64> {
        let value = self.window.next(bar.price(self.source));
        record(&mut self.history, value)
    }

    fn reset(&mut self) {
        self.window.reset();
        self.history.clear();
    }

    fn history(&self) -> &History<f64> {
        &self.history
    }

    fn history_mut(&mut self) -> &mut History<f64> {
        &mut self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn sma_5_basic() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        let mut sma = Sma::new(5).unwrap();
        let out: Vec<Option<f64>> = bars.iter().map(|b| sma.update(b)).collect();

        for (i, v) in out.iter().enumerate().take(4) {
            assert!(v.is_none(), "expected None at index {i}");
        }
        // SMA[4] = mean(10,11,12,13,14) = 12.0
        assert_approx(out[4].unwrap(), 12.0, DEFAULT_EPSILON);
        // SMA[5] = mean(11,12,13,14,15) = 13.0
        assert_approx(out[5].unwrap(), 13.0, DEFAULT_EPSILON);
        // SMA[6] = mean(12,13,14,15,16) = 14.0
        assert_approx(out[6].unwrap(), 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_1_is_close() {
        let bars = make_bars(&[100.0, 200.0, 300.0]);
        let sma = Sma::new(1).unwrap();
        assert_approx(sma.calculate(&bars, Some(0)).unwrap(), 100.0, DEFAULT_EPSILON);
        assert_approx(sma.calculate(&bars, Some(2)).unwrap(), 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_constant_series_equals_price() {
        let bars = make_bars(&[42.5; 30]);
        let sma = Sma::new(10).unwrap();
        for i in 9..30 {
            assert_approx(sma.calculate(&bars, Some(i)).unwrap(), 42.5, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn sma_hl2_source() {
        // make_bars: high = max(o,c)+1, low = min(o,c)-1 → hl2 = (o+c)/2
        let bars = make_bars(&[10.0, 20.0]);
        let sma = Sma::with_source(1, PriceSource::Hl2).unwrap();
        assert_approx(sma.calculate(&bars, Some(1)).unwrap(), 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_zero_period_rejected() {
        assert!(matches!(Sma::new(0), Err(ConfigError::ZeroPeriod { .. })));
    }

    #[test]
    fn sma_too_few_bars() {
        let bars = make_bars(&[10.0, 11.0]);
        let sma = Sma::new(5).unwrap();
        assert!(sma.calculate(&bars, None).is_none());
        assert_eq!(sma.required_candles(), 5);
    }
}
