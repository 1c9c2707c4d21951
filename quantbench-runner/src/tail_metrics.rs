//! Tail risk metrics — historical VaR and CVaR, plus distribution shape.
//!
//! All functions are pure: per-period returns in, scalar out. Losses are
//! reported as positive numbers.

use serde::{Deserialize, Serialize};

use crate::metrics::{mean_f64, std_dev};

/// Tail statistics of a return series at one confidence level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailMetrics {
    pub confidence: f64,
    pub value_at_risk: f64,
    pub conditional_value_at_risk: f64,
    /// Third standardized moment. `None` when σ is zero.
    pub skewness: Option<f64>,
    /// Fourth standardized moment minus 3. `None` when σ is zero.
    pub excess_kurtosis: Option<f64>,
    pub sample_size: usize,
}

impl TailMetrics {
    pub fn compute(returns: &[f64], confidence: f64) -> Self {
        Self {
            confidence,
            value_at_risk: value_at_risk(returns, confidence),
            conditional_value_at_risk: conditional_value_at_risk(returns, confidence),
            skewness: skewness(returns),
            excess_kurtosis: excess_kurtosis(returns),
            sample_size: returns.len(),
        }
    }
}

/// Historical VaR: the negated return at index ⌊(1 - c)·n⌋ of the
/// ascending-sorted series. 0.0 for an empty series.
pub fn value_at_risk(returns: &[f64], confidence: f64) -> f64 {
    match cutoff(returns, confidence) {
        Some((sorted, idx)) => -sorted[idx],
        None => 0.0,
    }
}

/// Historical CVaR: the negated mean of every return at or below the VaR
/// cutoff.
pub fn conditional_value_at_risk(returns: &[f64], confidence: f64) -> f64 {
    let Some((sorted, idx)) = cutoff(returns, confidence) else {
        return 0.0;
    };
    let threshold = sorted[idx];
    let tail: Vec<f64> = sorted.iter().copied().filter(|r| *r <= threshold).collect();
    -mean_f64(&tail)
}

pub fn skewness(returns: &[f64]) -> Option<f64> {
    standardized_moment(returns, 3)
}

pub fn excess_kurtosis(returns: &[f64]) -> Option<f64> {
    standardized_moment(returns, 4).map(|k| k - 3.0)
}

// ─── Helpers ────────────────────────────────────────────────────────

fn cutoff(returns: &[f64], confidence: f64) -> Option<(Vec<f64>, usize)> {
    if returns.is_empty() {
        return None;
    }
    let mut sorted = returns.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    let idx = (((1.0 - confidence) * n as f64).floor() as usize).min(n - 1);
    Some((sorted, idx))
}

fn standardized_moment(returns: &[f64], power: i32) -> Option<f64> {
    let std = std_dev(returns);
    if returns.is_empty() || std < 1e-15 {
        return None;
    }
    let mean = mean_f64(returns);
    let m = returns.iter().map(|r| ((r - mean) / std).powi(power)).sum::<f64>()
        / returns.len() as f64;
    Some(m)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hundred_returns() -> Vec<f64> {
        // -0.05, -0.04, ..., 0.94 shuffled by stride
        (0..100).map(|i| ((i * 37) % 100) as f64 / 100.0 - 0.05).collect()
    }

    #[test]
    fn var_picks_floor_index() {
        let r = hundred_returns();
        // floor(0.05 * 100) = 5 → sixth smallest = 0.00
        assert!((value_at_risk(&r, 0.95) - 0.0).abs() < 1e-12);
        // floor(0.01 * 100) = 1 → -0.04
        assert!((value_at_risk(&r, 0.99) - 0.04).abs() < 1e-12);
    }

    #[test]
    fn cvar_averages_the_tail() {
        let r = hundred_returns();
        // returns ≤ 0.00: -0.05..=0.00, mean -0.025
        assert!((conditional_value_at_risk(&r, 0.95) - 0.025).abs() < 1e-12);
        assert!(conditional_value_at_risk(&r, 0.95) >= value_at_risk(&r, 0.95));
    }

    #[test]
    fn empty_series() {
        assert_eq!(value_at_risk(&[], 0.95), 0.0);
        assert_eq!(conditional_value_at_risk(&[], 0.95), 0.0);
        assert_eq!(skewness(&[]), None);
    }

    #[test]
    fn symmetric_series_has_no_skew() {
        let r = [-0.02, -0.01, 0.0, 0.01, 0.02];
        assert!(skewness(&r).unwrap().abs() < 1e-12);
        assert!(excess_kurtosis(&r).unwrap() < 0.0);
        assert_eq!(skewness(&[0.01; 10]), None);
    }

    #[test]
    fn compute_bundles_everything() {
        let r = hundred_returns();
        let t = TailMetrics::compute(&r, 0.95);
        assert_eq!(t.sample_size, 100);
        assert_eq!(t.value_at_risk, value_at_risk(&r, 0.95));
    }
}
