//! Bar — the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sampling interval of a bar series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1w")]
    OneWeek,
}

impl Timeframe {
    pub fn as_millis(&self) -> i64 {
        const MINUTE: i64 = 60_000;
        match self {
            Timeframe::OneMinute => MINUTE,
            Timeframe::FiveMinutes => 5 * MINUTE,
            Timeframe::FifteenMinutes => 15 * MINUTE,
            Timeframe::ThirtyMinutes => 30 * MINUTE,
            Timeframe::OneHour => 60 * MINUTE,
            Timeframe::FourHours => 240 * MINUTE,
            Timeframe::OneDay => 1_440 * MINUTE,
            Timeframe::OneWeek => 10_080 * MINUTE,
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.as_millis())
    }

    /// Bars per year, for annualizing per-bar statistics. Daily bars use 252
    /// trading days; intraday frames assume continuous 24/7 trading.
    pub fn periods_per_year(&self) -> f64 {
        match self {
            Timeframe::OneDay => 252.0,
            Timeframe::OneWeek => 52.0,
            _ => (365.0 * 86_400_000.0) / self.as_millis() as f64,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timeframe::OneMinute => "1m",
            Timeframe::FiveMinutes => "5m",
            Timeframe::FifteenMinutes => "15m",
            Timeframe::ThirtyMinutes => "30m",
            Timeframe::OneHour => "1h",
            Timeframe::FourHours => "4h",
            Timeframe::OneDay => "1d",
            Timeframe::OneWeek => "1w",
        };
        f.write_str(s)
    }
}

/// Which price of a bar an indicator reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    Open,
    High,
    Low,
    #[default]
    Close,
    /// (high + low) / 2
    Hl2,
    /// (high + low + close) / 3
    Hlc3,
    /// (open + high + low + close) / 4
    Ohlc4,
}

/// OHLCV bar for a single symbol over one timeframe interval.
///
/// Bars are immutable once built; the engine requires strictly increasing
/// timestamps and never re-sorts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn price(&self, source: PriceSource) -> f64 {
        match source {
            PriceSource::Open => self.open,
            PriceSource::High => self.high,
            PriceSource::Low => self.low,
            PriceSource::Close => self.close,
            PriceSource::Hl2 => (self.high + self.low) / 2.0,
            PriceSource::Hlc3 => (self.high + self.low + self.close) / 3.0,
            PriceSource::Ohlc4 => (self.open + self.high + self.low + self.close) / 4.0,
        }
    }

    /// Basic OHLCV sanity check: finite, positive prices and a consistent range.
    pub fn is_sane(&self) -> bool {
        let fields = [self.open, self.high, self.low, self.close, self.volume];
        if fields.iter().any(|v| !v.is_finite()) {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.low > 0.0
            && self.volume >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_bar() -> Bar {
        Bar {
            symbol: "BTCUSDT".into(),
            timeframe: Timeframe::OneHour,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            open: 100.0,
            high: 106.0,
            low: 98.0,
            close: 103.0,
            volume: 50_000.0,
        }
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar().is_sane());
    }

    #[test]
    fn bar_high_below_close_is_insane() {
        let mut bar = sample_bar();
        bar.high = 101.0;
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_nan_is_insane() {
        let mut bar = sample_bar();
        bar.close = f64::NAN;
        assert!(!bar.is_sane());
    }

    #[test]
    fn price_sources() {
        let bar = sample_bar();
        assert_eq!(bar.price(PriceSource::Open), 100.0);
        assert_eq!(bar.price(PriceSource::Hl2), 102.0);
        assert_eq!(bar.price(PriceSource::Hlc3), (106.0 + 98.0 + 103.0) / 3.0);
        assert_eq!(bar.price(PriceSource::Ohlc4), (100.0 + 106.0 + 98.0 + 103.0) / 4.0);
    }

    #[test]
    fn timeframe_serde_uses_short_names() {
        let json = serde_json::to_string(&Timeframe::FourHours).unwrap();
        assert_eq!(json, "\"4h\"");
        let tf: Timeframe = serde_json::from_str("\"1d\"").unwrap();
        assert_eq!(tf, Timeframe::OneDay);
        assert_eq!(tf.to_string(), "1d");
    }

    #[test]
    fn timeframe_periods_per_year() {
        assert_eq!(Timeframe::OneDay.periods_per_year(), 252.0);
        assert!((Timeframe::OneHour.periods_per_year() - 8760.0).abs() < 1e-9);
    }
}
