//! In-memory bar store.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::BarSource;
use crate::domain::{Bar, Timeframe};
use crate::engine::validate_bars;
use crate::error::DataError;

#[derive(Debug, Clone, Default)]
pub struct InMemoryBarSource {
    series: HashMap<(String, Timeframe), Vec<Bar>>,
}

impl InMemoryBarSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a validated series, replacing any existing one for the same
    /// symbol and timeframe.
    pub fn insert(&mut self, bars: Vec<Bar>) -> Result<(), DataError> {
        validate_bars(&bars)?;
        let key = (bars[0].symbol.clone(), bars[0].timeframe);
        self.series.insert(key, bars);
        Ok(())
    }

    pub fn with_series(mut self, bars: Vec<Bar>) -> Result<Self, DataError> {
        self.insert(bars)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    fn series(&self, symbol: &str, timeframe: Timeframe) -> Result<&[Bar], DataError> {
        self.series
            .get(&(symbol.to_string(), timeframe))
            .map(Vec::as_slice)
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
                timeframe: timeframe.to_string(),
            })
    }
}

impl BarSource for InMemoryBarSource {
    fn bars_in_range(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, DataError> {
        let bars = self.series(symbol, timeframe)?;
        // series are sorted, so both bounds are binary searches
        let lo = bars.partition_point(|b| b.timestamp < start);
        let hi = bars.partition_point(|b| b.timestamp < end);
        Ok(bars[lo..hi.max(lo)].to_vec())
    }

    fn recent_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        n: usize,
    ) -> Result<Vec<Bar>, DataError> {
        let bars = self.series(symbol, timeframe)?;
        Ok(bars[bars.len().saturating_sub(n)..].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SyntheticBars;
    use chrono::Duration;

    fn source() -> (InMemoryBarSource, Vec<Bar>) {
        let bars = SyntheticBars::new("SPY", Timeframe::OneDay).seed(7).generate(20);
        let src = InMemoryBarSource::new().with_series(bars.clone()).unwrap();
        (src, bars)
    }

    #[test]
    fn range_is_half_open() {
        let (src, bars) = source();
        let got = src
            .bars_in_range("SPY", Timeframe::OneDay, bars[3].timestamp, bars[7].timestamp)
            .unwrap();
        assert_eq!(got.len(), 4);
        assert_eq!(got[0], bars[3]);
        assert_eq!(got[3], bars[6]);
    }

    #[test]
    fn inverted_range_is_empty() {
        let (src, bars) = source();
        let got = src
            .bars_in_range(
                "SPY",
                Timeframe::OneDay,
                bars[10].timestamp,
                bars[2].timestamp - Duration::days(1),
            )
            .unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn recent_bars_caps_at_available() {
        let (src, bars) = source();
        let got = src.recent_bars("SPY", Timeframe::OneDay, 5).unwrap();
        assert_eq!(got.as_slice(), &bars[15..]);
        assert_eq!(src.recent_bars("SPY", Timeframe::OneDay, 100).unwrap().len(), 20);
    }

    #[test]
    fn unknown_series_errors() {
        let (src, _) = source();
        assert!(matches!(
            src.recent_bars("SPY", Timeframe::OneHour, 1),
            Err(DataError::SymbolNotFound { .. })
        ));
    }

    #[test]
    fn insert_rejects_unsorted() {
        let (_, mut bars) = source();
        bars.swap(0, 1);
        assert!(InMemoryBarSource::new().insert(bars).is_err());
    }
}
