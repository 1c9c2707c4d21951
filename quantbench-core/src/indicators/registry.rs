//! Heterogeneous indicator storage for the strategy context.
//!
//! Concrete indicators have different output types; the registry erases
//! them behind [`DynIndicator`], which reports values as a tagged
//! [`IndicatorValue`].

use serde::{Deserialize, Serialize};

use super::{BollingerValue, Indicator, MacdValue, StochasticValue, VolumeProfileValue};
use crate::domain::Bar;

/// Output of any indicator, tagged by shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndicatorValue {
    Scalar { value: f64 },
    Macd(MacdValue),
    Bollinger(BollingerValue),
    Stochastic(StochasticValue),
    VolumeProfile(VolumeProfileValue),
}

impl IndicatorValue {
    /// The primary scalar reading: the value itself, the MACD line, the
    /// Bollinger middle band, %K, or the POC price.
    pub fn primary(&self) -> f64 {
        match self {
            IndicatorValue::Scalar { value } => *value,
            IndicatorValue::Macd(v) => v.macd,
            IndicatorValue::Bollinger(v) => v.middle,
            IndicatorValue::Stochastic(v) => v.k,
            IndicatorValue::VolumeProfile(v) => v.poc_price,
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            IndicatorValue::Scalar { value } => Some(*value),
            _ => None,
        }
    }
}

impl From<f64> for IndicatorValue {
    fn from(value: f64) -> Self {
        IndicatorValue::Scalar { value }
    }
}

impl From<MacdValue> for IndicatorValue {
    fn from(v: MacdValue) -> Self {
        IndicatorValue::Macd(v)
    }
}

impl From<BollingerValue> for IndicatorValue {
    fn from(v: BollingerValue) -> Self {
        IndicatorValue::Bollinger(v)
    }
}

impl From<StochasticValue> for IndicatorValue {
    fn from(v: StochasticValue) -> Self {
        IndicatorValue::Stochastic(v)
    }
}

impl From<VolumeProfileValue> for IndicatorValue {
    fn from(v: VolumeProfileValue) -> Self {
        IndicatorValue::VolumeProfile(v)
    }
}

/// Object-safe view of an [`Indicator`].
pub trait DynIndicator: Send + Sync {
    fn name(&self) -> &str;
    fn required_candles(&self) -> usize;
    fn update_value(&mut self, bar: &Bar) -> Option<IndicatorValue>;
    fn latest(&self) -> Option<IndicatorValue>;
    /// Value `n` updates before the latest one.
    fn ago(&self, n: usize) -> Option<IndicatorValue>;
    fn reset(&mut self);
    fn set_history_limit(&mut self, limit: usize);
}

/// Adapter from a concrete indicator to [`DynIndicator`].
#[derive(Debug, Clone)]
pub struct Erased<I>(pub I);

/// Box a concrete indicator for storage in an [`IndicatorSet`].
pub fn erase<I>(indicator: I) -> Box<dyn DynIndicator>
where
    I: Indicator + 'static,
    I::Output: Into<IndicatorValue>,
{
    Box::new(Erased(indicator))
}

impl<I> DynIndicator for Erased<I>
where
    I: Indicator,
    I::Output: Into<IndicatorValue>,
{
    fn name(&self) -> &str {
        self.0.name()
    }

    fn required_candles(&self) -> usize {
        self.0.required_candles()
    }

    fn update_value(&mut self, bar: &Bar) -> Option<IndicatorValue> {
        self.0.update(bar).map(Into::into)
    }

    fn latest(&self) -> Option<IndicatorValue> {
        self.0.value().cloned().map(Into::into)
    }

    fn ago(&self, n: usize) -> Option<IndicatorValue> {
        self.0.history().ago(n).cloned().map(Into::into)
    }

    fn reset(&mut self) {
        self.0.reset();
    }

    fn set_history_limit(&mut self, limit: usize) {
        self.0.set_history_limit(limit);
    }
}

/// Named indicators updated together, in registration order.
#[derive(Default)]
pub struct IndicatorSet {
    entries: Vec<(String, Box<dyn DynIndicator>)>,
}

impl IndicatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an indicator under `key`, replacing any previous one with
    /// the same key.
    pub fn insert(&mut self, key: impl Into<String>, indicator: Box<dyn DynIndicator>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = indicator,
            None => self.entries.push((key, indicator)),
        }
    }

    pub fn add<I>(&mut self, key: impl Into<String>, indicator: I)
    where
        I: Indicator + 'static,
        I::Output: Into<IndicatorValue>,
    {
        self.insert(key, erase(indicator));
    }

    pub fn update_all(&mut self, bar: &Bar) {
        for (_, indicator) in &mut self.entries {
            indicator.update_value(bar);
        }
    }

    pub fn get(&self, key: &str) -> Option<&dyn DynIndicator> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, ind)| ind.as_ref())
    }

    /// Latest value of the indicator registered under `key`.
    pub fn value(&self, key: &str) -> Option<IndicatorValue> {
        self.get(key)?.latest()
    }

    /// Latest scalar value, `None` for unknown keys, warming-up indicators
    /// and non-scalar outputs.
    pub fn scalar(&self, key: &str) -> Option<f64> {
        self.value(key)?.as_scalar()
    }

    /// Value `n` updates before the latest.
    pub fn previous(&self, key: &str, n: usize) -> Option<IndicatorValue> {
        self.get(key)?.ago(n)
    }

    /// Largest `required_candles` among registered indicators.
    pub fn max_required_candles(&self) -> usize {
        self.entries
            .iter()
            .map(|(_, ind)| ind.required_candles())
            .max()
            .unwrap_or(0)
    }

    pub fn set_history_limit(&mut self, limit: usize) {
        for (_, indicator) in &mut self.entries {
            indicator.set_history_limit(limit);
        }
    }

    pub fn reset_all(&mut self) {
        for (_, indicator) in &mut self.entries {
            indicator.reset();
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for IndicatorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}
