//! Bollinger Bands.
//!
//! middle = SMA(period); σ = population standard deviation (divide by N)
//! over the same window; upper/lower = middle ± k·σ.
//! %B = (price - lower) / (upper - lower), defined as 0.5 when the bands
//! collapse. Bandwidth = (upper - lower) / middle.
//! Required candles: period.

use serde::{Deserialize, Serialize};

use super::rolling::{History, MeanWindow};
use super::{check_period, check_positive, record, Indicator};
use crate::domain::{Bar, PriceSource};
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerValue {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    pub std_dev: f64,
    pub percent_b: f64,
    pub bandwidth: f64,
}

#[derive(Debug, Clone)]
pub struct BollingerBands {
    period: usize,
    multiplier: f64,
    source: PriceSource,
    name: String,
    window: MeanWindow,
    history: History<BollingerValue>,
}

impl BollingerBands {
    pub fn new(period: usize, multiplier: f64) -> Result<Self, ConfigError> {
        Self::with_source(period, multiplier, PriceSource::Close)
    }

    pub fn with_source(
        period: usize,
        multiplier: f64,
        source: PriceSource,
    ) -> Result<Self, ConfigError> {
        let period = check_period("Bollinger", "period", period)?;
        let multiplier = check_positive("Bollinger", "multiplier", multiplier)?;
        Ok(Self {
            period,
            multiplier,
            source,
            name: format!("bb_{period}_{multiplier}"),
            window: MeanWindow::new(period),
            history: History::default(),
        })
    }
}

impl Indicator for BollingerBands {
    type Output = BollingerValue;

    fn name(&self) -> &str {
        &self.name
    }

    fn required_candles(&self) -> usize {
        self.period
    }

    fn update(&mut self, bar: &Bar) -> Option<BollingerValue> {
        let price = bar.price(self.source);
        self.window.next(price);
        let value = match (self.window.mean(), self.window.population_variance()) {
            (Some(middle), Some(variance)) => {
                let std_dev = variance.sqrt();
                let upper = middle + self.multiplier * std_dev;
                let lower = middle - self.multiplier * std_dev;
                let width = upper - lower;
                let percent_b = if width == 0.0 {
                    0.5
                } else {
                    (price - lower) / width
                };
                let bandwidth = if middle == 0.0 { 0.0 } else { width / middle };
                Some(BollingerValue {
                    upper,
                    middle,
                    lower,
                    std_dev,
                    percent_b,
                    bandwidth,
                })
            }
            _ => None,
        };
        record(&mut self.history, value)
    }

    fn reset(&mut self) {
        self.window.reset();
        self.history.clear();
    }

    fn history(&self) -> &History<BollingerValue> {
        &self.history
    }

    fn history_mut(&mut self) -> &mut History<BollingerValue> {
        &mut self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn bollinger_uses_population_std() {
        // Window [2, 4, 4, 4, 5, 5, 7, 9]: mean 5, population σ = 2
        let bars = make_bars(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let bb = BollingerBands::new(8, 2.0).unwrap();
        let v = bb.calculate(&bars, None).unwrap();
        assert_approx(v.middle, 5.0, DEFAULT_EPSILON);
        assert_approx(v.std_dev, 2.0, DEFAULT_EPSILON);
        assert_approx(v.upper, 9.0, DEFAULT_EPSILON);
        assert_approx(v.lower, 1.0, DEFAULT_EPSILON);
        // %B at price 9 = (9-1)/(9-1) = 1.0
        assert_approx(v.percent_b, 1.0, DEFAULT_EPSILON);
        assert_approx(v.bandwidth, 8.0 / 5.0, DEFAULT_EPSILON);
    }

    #[test]
    fn bollinger_flat_series_percent_b_is_half() {
        let bars = make_bars(&[10.0; 5]);
        let v = BollingerBands::new(5, 2.0).unwrap().calculate(&bars, None).unwrap();
        assert_eq!(v.std_dev, 0.0);
        assert_eq!(v.percent_b, 0.5);
        assert_eq!(v.upper, v.lower);
    }

    #[test]
    fn bollinger_invalid_multiplier() {
        assert!(BollingerBands::new(20, 0.0).is_err());
        assert!(BollingerBands::new(20, -1.0).is_err());
        assert!(BollingerBands::new(20, f64::NAN).is_err());
    }

    #[test]
    fn bollinger_warmup() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        let bb = BollingerBands::new(4, 2.0).unwrap();
        assert!(bb.calculate(&bars, None).is_none());
    }
}
