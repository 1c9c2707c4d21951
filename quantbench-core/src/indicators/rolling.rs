//! Bounded buffers and the scalar recurrences shared by several indicators.
//!
//! `MeanWindow` and `EmaState` are the single implementation of SMA and EMA
//! arithmetic. SMA, EMA, MACD, Bollinger and Stochastic all feed values
//! through them, so there is exactly one formula per recurrence.

use std::collections::VecDeque;

/// Default number of computed values an indicator keeps.
pub const DEFAULT_HISTORY_LIMIT: usize = 1_000;

/// Fixed-capacity FIFO. Pushing into a full window evicts the oldest item.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RollingWindow<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a value, returning the evicted one if the window was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Bounded record of computed indicator values, oldest first.
#[derive(Debug, Clone)]
pub struct History<T> {
    values: VecDeque<T>,
    limit: usize,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl<T> History<T> {
    /// A limit of 0 is treated as 1; the latest value is always retained.
    pub fn new(limit: usize) -> Self {
        Self {
            values: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    pub fn push(&mut self, value: T) {
        if self.values.len() == self.limit {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn latest(&self) -> Option<&T> {
        self.values.back()
    }

    /// Value `n` steps back from the latest (0 = latest).
    pub fn ago(&self, n: usize) -> Option<&T> {
        let len = self.values.len();
        if n >= len {
            return None;
        }
        self.values.get(len - 1 - n)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        while self.values.len() > self.limit {
            self.values.pop_front();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.values.iter()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// Arithmetic mean of the last `period` values.
#[derive(Debug, Clone)]
pub struct MeanWindow {
    window: RollingWindow<f64>,
}

impl MeanWindow {
    pub fn new(period: usize) -> Self {
        Self {
            window: RollingWindow::new(period),
        }
    }

    pub fn next(&mut self, value: f64) -> Option<f64> {
        self.window.push(value);
        self.mean()
    }

    /// Mean of the current window, `None` until it is full.
    pub fn mean(&self) -> Option<f64> {
        if !self.window.is_full() {
            return None;
        }
        let sum: f64 = self.window.iter().sum();
        Some(sum / self.window.capacity() as f64)
    }

    /// Population variance (divide by N) of the current window.
    pub fn population_variance(&self) -> Option<f64> {
        let mean = self.mean()?;
        let n = self.window.capacity() as f64;
        let ss: f64 = self.window.iter().map(|v| (v - mean).powi(2)).sum();
        Some(ss / n)
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }
}

/// EMA recurrence seeded with the simple mean of the first `period` values.
///
/// `k = 2 / (period + 1)`; `ema = x * k + prev * (1 - k)`.
#[derive(Debug, Clone)]
pub struct EmaState {
    period: usize,
    k: f64,
    seed_sum: f64,
    seen: usize,
    value: Option<f64>,
}

impl EmaState {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            k: 2.0 / (period as f64 + 1.0),
            seed_sum: 0.0,
            seen: 0,
            value: None,
        }
    }

    pub fn next(&mut self, x: f64) -> Option<f64> {
        self.value = match self.value {
            Some(prev) => Some(x * self.k + prev * (1.0 - self.k)),
            None => {
                self.seed_sum += x;
                self.seen += 1;
                if self.seen == self.period {
                    Some(self.seed_sum / self.period as f64)
                } else {
                    None
                }
            }
        };
        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn reset(&mut self) {
        self.seed_sum = 0.0;
        self.seen = 0;
        self.value = None;
    }
}

/// Wilder smoothing: first value is the simple mean of `period` inputs,
/// then `avg = (prev * (period - 1) + x) / period`.
#[derive(Debug, Clone)]
pub struct WilderState {
    period: usize,
    seed_sum: f64,
    seen: usize,
    value: Option<f64>,
}

impl WilderState {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            seed_sum: 0.0,
            seen: 0,
            value: None,
        }
    }

    pub fn next(&mut self, x: f64) -> Option<f64> {
        let n = self.period as f64;
        self.value = match self.value {
            Some(prev) => Some((prev * (n - 1.0) + x) / n),
            None => {
                self.seed_sum += x;
                self.seen += 1;
                if self.seen == self.period {
                    Some(self.seed_sum / n)
                } else {
                    None
                }
            }
        };
        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn reset(&mut self) {
        self.seed_sum = 0.0;
        self.seen = 0;
        self.value = None;
    }
}
