//! Relative Strength Index (RSI).
//!
//! Wilder smoothing of average gains and average losses over close-to-close
//! changes. The first averages are simple means of `period` changes.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss); RSI = 100 when avg_loss == 0,
//! including a perfectly flat series.
//! Required candles: period + 1.

use super::rolling::{History, WilderState};
use super::{check_period, record, Indicator};
use crate::domain::Bar;
use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
    prev_close: Option<f64>,
    avg_gain: WilderState,
    avg_loss: WilderState,
    history: History<f64>,
}

impl Rsi {
    pub fn new(period: usize) -> Result<Self, ConfigError> {
        let period = check_period("RSI", "period", period)?;
        Ok(Self {
            period,
            name: format!("rsi_{period}"),
            prev_close: None,
            avg_gain: WilderState::new(period),
            avg_loss: WilderState::new(period),
            history: History::default(),
        })
    }
}

impl Indicator for Rsi {
    type Output = f64;

    fn name(&self) -> &str {
        &self.name
    }

    fn required_candles(&self) -> usize {
        self.period + 1
    }

    fn update(&mut self, bar: &Bar) -> Option<f64> {
        let prev = self.prev_close.replace(bar.close);
        let value = prev.and_then(|prev| {
            let change = bar.close - prev;
            let gain = self.avg_gain.next(change.max(0.0));
            let loss = self.avg_loss.next((-change).max(0.0));
            Some(compute_rsi(gain?, loss?))
        });
        record(&mut self.history, value)
    }

    fn reset(&mut self) {
        self.prev_close = None;
        self.avg_gain.reset();
        self.avg_loss.reset();
        self.history.clear();
    }

    fn history(&self) -> &History<f64> {
        &self.history
    }

    fn history_mut(&mut self) -> &mut History<f64> {
        &mut self.history
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};

    #[test]
    fn rsi_all_gains() {
        let bars = make_bars(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        let rsi = Rsi::new(3).unwrap();
        // All positive changes → RSI = 100
        assert_approx(rsi.calculate(&bars, Some(3)).unwrap(), 100.0, 1e-9);
        assert_approx(rsi.calculate(&bars, None).unwrap(), 100.0, 1e-9);
    }

    #[test]
    fn rsi_all_losses() {
        let bars = make_bars(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0]);
        let rsi = Rsi::new(3).unwrap();
        // All negative changes → RSI = 0
        assert_approx(rsi.calculate(&bars, Some(3)).unwrap(), 0.0, 1e-9);
    }

    #[test]
    fn rsi_flat_series_is_100() {
        let bars = make_bars(&[50.0; 10]);
        let rsi = Rsi::new(4).unwrap();
        assert_approx(rsi.calculate(&bars, None).unwrap(), 100.0, 1e-9);
    }

    #[test]
    fn rsi_mixed_seed_and_smoothing() {
        // Closes: 44, 44.34, 44.09, 43.61, 44.33
        // Changes: +0.34, -0.25, -0.48, +0.72
        // period=3 seed: avg_gain = 0.34/3, avg_loss = 0.73/3
        // RSI[3] = 100 - 100/(1 + 0.34/0.73) = 31.7757...
        // Wilder: avg_gain = (0.34/3*2 + 0.72)/3, avg_loss = (0.73/3*2 + 0)/3
        let bars = make_bars(&[44.0, 44.34, 44.09, 43.61, 44.33]);
        let rsi = Rsi::new(3).unwrap();

        for i in 0..3 {
            assert!(rsi.calculate(&bars, Some(i)).is_none());
        }
        let expected_3 = 100.0 - 100.0 / (1.0 + 0.34 / 0.73);
        assert_approx(rsi.calculate(&bars, Some(3)).unwrap(), expected_3, 1e-9);

        let g = (0.34 / 3.0 * 2.0 + 0.72) / 3.0;
        let l = (0.73 / 3.0 * 2.0) / 3.0;
        let expected_4 = 100.0 - 100.0 / (1.0 + g / l);
        assert_approx(rsi.calculate(&bars, Some(4)).unwrap(), expected_4, 1e-9);
    }

    #[test]
    fn rsi_required_candles() {
        assert_eq!(Rsi::new(14).unwrap().required_candles(), 15);
    }
}
