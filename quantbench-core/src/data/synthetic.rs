//! Seeded random-walk bar generator.
//!
//! Output is clearly fake. Same seed, same bars.

use chrono::{DateTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{Bar, Timeframe};

#[derive(Debug, Clone)]
pub struct SyntheticBars {
    symbol: String,
    timeframe: Timeframe,
    seed: u64,
    start: DateTime<Utc>,
    start_price: f64,
    /// Per-bar returns are drawn uniformly from `drift ± volatility`.
    volatility: f64,
    drift: f64,
}

impl SyntheticBars {
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            seed: 42,
            start: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).single().unwrap_or_default(),
            start_price: 100.0,
            volatility: 0.03,
            drift: 0.0,
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn start(mut self, start: DateTime<Utc>) -> Self {
        self.start = start;
        self
    }

    pub fn start_price(mut self, price: f64) -> Self {
        self.start_price = price;
        self
    }

    pub fn volatility(mut self, volatility: f64) -> Self {
        self.volatility = volatility.abs();
        self
    }

    pub fn drift(mut self, drift: f64) -> Self {
        self.drift = drift;
        self
    }

    pub fn generate(&self, count: usize) -> Vec<Bar> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let step = self.timeframe.duration();
        let mut price = self.start_price.max(f64::MIN_POSITIVE);
        let mut bars = Vec::with_capacity(count);

        for i in 0..count {
            let shock = if self.volatility > 0.0 {
                rng.gen_range(-self.volatility..self.volatility)
            } else {
                0.0
            };
            // keep the walk strictly positive
            let ret = (self.drift + shock).max(-0.5);
            let open = price;
            let close = price * (1.0 + ret);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000.0..5_000_000.0_f64).round();

            bars.push(Bar {
                symbol: self.symbol.clone(),
                timeframe: self.timeframe,
                timestamp: self.start + step * i as i32,
                open,
                high,
                low,
                close,
                volume,
            });
            price = close;
        }
        bars
    }
}
