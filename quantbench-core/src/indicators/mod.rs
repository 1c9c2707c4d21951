//! Streaming technical indicators.
//!
//! Every indicator is a value type implementing [`Indicator`]: it consumes one
//! bar at a time through `update` and keeps only the state its recurrence
//! needs. `calculate` is not a second formula; it replays `update` over a
//! reset copy, so historical and incremental values always agree.
//!
//! Before `required_candles` bars have been seen both paths return `None`.

pub mod atr;
pub mod bollinger;
pub mod config;
pub mod ema;
pub mod macd;
pub mod obv;
pub mod registry;
pub mod rolling;
pub mod rsi;
pub mod sma;
pub mod stochastic;
pub mod volume_profile;

pub use atr::{true_range, Atr};
pub use bollinger::{BollingerBands, BollingerValue};
pub use config::IndicatorConfig;
pub use ema::Ema;
pub use macd::{Macd, MacdValue};
pub use obv::Obv;
pub use registry::{erase, DynIndicator, IndicatorSet, IndicatorValue};
pub use rolling::{History, RollingWindow, DEFAULT_HISTORY_LIMIT};
pub use rsi::Rsi;
pub use sma::Sma;
pub use stochastic::{Stochastic, StochasticValue};
pub use volume_profile::{VolumeProfile, VolumeProfileValue};

use std::fmt::Debug;

use crate::domain::Bar;
use crate::error::ConfigError;

/// Capability shared by all indicators.
pub trait Indicator: Send + Sync {
    type Output: Clone + Debug + Send + Sync;

    fn name(&self) -> &str;

    /// Bars needed before the first value is produced.
    fn required_candles(&self) -> usize;

    /// Consume the next bar and return the value at that bar, if any.
    fn update(&mut self, bar: &Bar) -> Option<Self::Output>;

    /// Drop all state, returning the indicator to its freshly built form.
    fn reset(&mut self);

    fn history(&self) -> &History<Self::Output>;

    fn history_mut(&mut self) -> &mut History<Self::Output>;

    /// Latest computed value.
    fn value(&self) -> Option<&Self::Output> {
        self.history().latest()
    }

    fn set_history_limit(&mut self, limit: usize) {
        self.history_mut().set_limit(limit);
    }

    /// Value at `index` (or at the last bar when `None`) computed from
    /// scratch by replaying `update` on a reset copy of this indicator.
    /// Out-of-range indices yield `None`.
    fn calculate(&self, bars: &[Bar], index: Option<usize>) -> Option<Self::Output>
    where
        Self: Sized + Clone,
    {
        let end = match index {
            Some(i) => i.checked_add(1)?,
            None => bars.len(),
        };
        let window = bars.get(..end)?;
        let mut fresh = self.clone();
        fresh.reset();
        let mut last = None;
        for bar in window {
            last = fresh.update(bar);
        }
        last
    }
}

/// Append a computed value to the history and pass it through.
pub(crate) fn record<T: Clone>(history: &mut History<T>, value: Option<T>) -> Option<T> {
    if let Some(v) = &value {
        history.push(v.clone());
    }
    value
}

pub(crate) fn check_period(
    component: &'static str,
    param: &'static str,
    value: usize,
) -> Result<usize, ConfigError> {
    if value == 0 {
        return Err(ConfigError::ZeroPeriod {
            component,
            param,
            value,
        });
    }
    Ok(value)
}

pub(crate) fn check_positive(
    component: &'static str,
    param: &'static str,
    value: f64,
) -> Result<f64, ConfigError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(ConfigError::NonPositive {
            component,
            param,
            value,
        });
    }
    Ok(value)
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    use crate::domain::Timeframe;
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                symbol: "TEST".to_string(),
                timeframe: Timeframe::OneDay,
                timestamp: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calculate_out_of_range_is_none() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        let sma = Sma::new(2).unwrap();
        assert!(sma.calculate(&bars, Some(3)).is_none());
        assert!(sma.calculate(&bars, Some(usize::MAX)).is_none());
    }

    #[test]
    fn calculate_ignores_live_state() {
        let bars = make_bars(&[1.0, 2.0, 3.0, 4.0]);
        let mut sma = Sma::new(2).unwrap();
        for bar in &bars {
            sma.update(bar);
        }
        // The live instance has seen all four bars; calculate at index 1
        // must only see the first two.
        assert_approx(sma.calculate(&bars, Some(1)).unwrap(), 1.5, DEFAULT_EPSILON);
        assert_approx(*sma.value().unwrap(), 3.5, DEFAULT_EPSILON);
    }

    #[test]
    fn reset_clears_history() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        let mut sma = Sma::new(1).unwrap();
        for bar in &bars {
            sma.update(bar);
        }
        assert_eq!(sma.history().len(), 3);
        sma.reset();
        assert!(sma.value().is_none());
        assert!(sma.history().is_empty());
    }

    #[test]
    fn history_limit_applies() {
        let closes: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let bars = make_bars(&closes);
        let mut ema = Ema::new(3).unwrap();
        ema.set_history_limit(10);
        for bar in &bars {
            ema.update(bar);
        }
        assert_eq!(ema.history().len(), 10);
    }
}
