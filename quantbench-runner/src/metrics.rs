//! Performance metrics — pure functions over returns, equity and trades.
//!
//! Every statistic uses population (N) denominators. Ratios that would divide
//! by zero follow fixed conventions documented on each function.

use serde::{Deserialize, Serialize};

use quantbench_core::domain::{OrderSide, Trade};

use crate::tail_metrics::{conditional_value_at_risk, value_at_risk};

const MS_PER_YEAR: f64 = 365.25 * 86_400_000.0;

/// Parameters shared by the ratio calculations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsOptions {
    /// Annual risk-free rate; divided by `periods_per_year` per return.
    pub risk_free_rate: f64,
    pub var_confidence: f64,
    pub periods_per_year: f64,
}

impl Default for MetricsOptions {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            var_confidence: 0.95,
            periods_per_year: 252.0,
        }
    }
}

/// Peak-to-trough decline of an equity curve.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MaxDrawdown {
    pub amount: f64,
    /// `amount / peak`.
    pub fraction: f64,
    pub peak_index: usize,
    pub trough_index: usize,
}

/// Statistics over the net P&L of closing trades.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TradeStats {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub gross_profit: f64,
    /// Magnitude of the summed losses.
    pub gross_loss: f64,
    #[serde(with = "unbounded")]
    pub profit_factor: f64,
    /// Mean net P&L per trade.
    pub expectancy: f64,
    pub average_win: f64,
    /// Magnitude of the mean losing trade.
    pub average_loss: f64,
    pub largest_win: f64,
    /// Magnitude of the worst trade.
    pub largest_loss: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
}

/// Aggregate performance metrics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub initial_equity: f64,
    pub final_equity: f64,
    pub total_return: f64,
    /// Can overflow to infinity over very short spans.
    #[serde(with = "unbounded")]
    pub annualized_return: f64,
    /// Annualized standard deviation of per-period returns.
    pub volatility: f64,
    /// Per-period Sharpe.
    pub sharpe_ratio: f64,
    pub annualized_sharpe: f64,
    #[serde(with = "unbounded")]
    pub sortino_ratio: f64,
    #[serde(with = "unbounded")]
    pub calmar_ratio: f64,
    pub max_drawdown: MaxDrawdown,
    pub value_at_risk: f64,
    pub conditional_value_at_risk: f64,
    pub trades: TradeStats,
    pub duration_ms: i64,
}

impl PerformanceMetrics {
    /// Metrics from the trade stream alone.
    ///
    /// The equity curve is rebuilt trade by trade: buys subtract their
    /// commission, closing trades add their net P&L. If `final_equity`
    /// differs from the rebuilt end point (positions still open), it is
    /// appended as the last point.
    ///
    /// Annualizes with [`MetricsOptions::default`], i.e. 252 daily periods
    /// and a zero risk-free rate. Use [`Self::calculate_with_options`] for
    /// other bar sizes.
    pub fn calculate(
        trades: &[Trade],
        initial_capital: f64,
        final_equity: f64,
        duration_ms: i64,
    ) -> Self {
        Self::calculate_with_options(
            trades,
            initial_capital,
            final_equity,
            duration_ms,
            &MetricsOptions::default(),
        )
    }

    pub fn calculate_with_options(
        trades: &[Trade],
        initial_capital: f64,
        final_equity: f64,
        duration_ms: i64,
        options: &MetricsOptions,
    ) -> Self {
        let curve = trade_equity_curve(trades, initial_capital, final_equity);
        Self::from_curve(&curve, trades, duration_ms, options)
    }

    /// Metrics from the engine's bar-level equity curve, annualized with
    /// [`MetricsOptions::default`] (252 periods). [`Self::from_curve`] takes
    /// explicit options.
    pub fn calculate_with_equity(trades: &[Trade], equity_curve: &[f64], duration_ms: i64) -> Self {
        Self::from_curve(equity_curve, trades, duration_ms, &MetricsOptions::default())
    }

    pub fn from_curve(
        equity_curve: &[f64],
        trades: &[Trade],
        duration_ms: i64,
        options: &MetricsOptions,
    ) -> Self {
        let initial_equity = equity_curve.first().copied().unwrap_or(0.0);
        let final_equity = equity_curve.last().copied().unwrap_or(initial_equity);
        let returns = returns(equity_curve);
        let ppy = options.periods_per_year;
        let rf = options.risk_free_rate / ppy;

        let total_return = total_return(initial_equity, final_equity);
        let annualized_return = annualized_return(total_return, duration_ms);
        let max_drawdown = max_drawdown(equity_curve);
        let sharpe = sharpe_ratio(&returns, rf);

        Self {
            initial_equity,
            final_equity,
            total_return,
            annualized_return,
            volatility: std_dev(&returns) * ppy.sqrt(),
            sharpe_ratio: sharpe,
            annualized_sharpe: sharpe * ppy.sqrt(),
            sortino_ratio: sortino_ratio(&returns, rf),
            calmar_ratio: calmar_ratio(annualized_return, max_drawdown.fraction),
            max_drawdown,
            value_at_risk: value_at_risk(&returns, options.var_confidence),
            conditional_value_at_risk: conditional_value_at_risk(&returns, options.var_confidence),
            trades: TradeStats::from_trades(trades),
            duration_ms,
        }
    }
}

impl TradeStats {
    /// Stats over the closing trades in `trades`; opening fills are ignored.
    pub fn from_trades(trades: &[Trade]) -> Self {
        let pnls: Vec<f64> = trades.iter().filter_map(|t| t.realized_pnl).collect();
        Self::from_pnls(&pnls)
    }

    pub fn from_pnls(pnls: &[f64]) -> Self {
        if pnls.is_empty() {
            return Self::default();
        }
        let wins: Vec<f64> = pnls.iter().copied().filter(|p| *p > 0.0).collect();
        let losses: Vec<f64> = pnls.iter().copied().filter(|p| *p < 0.0).collect();
        let gross_profit: f64 = wins.iter().sum();
        let gross_loss: f64 = -losses.iter().sum::<f64>();

        Self {
            total_trades: pnls.len(),
            winning_trades: wins.len(),
            losing_trades: losses.len(),
            win_rate: wins.len() as f64 / pnls.len() as f64,
            gross_profit,
            gross_loss,
            profit_factor: profit_factor(gross_profit, gross_loss),
            expectancy: mean_f64(pnls),
            average_win: mean_f64(&wins),
            average_loss: mean_f64(&losses).abs(),
            largest_win: wins.iter().copied().fold(0.0, f64::max),
            largest_loss: losses.iter().copied().fold(0.0, f64::min).abs(),
            max_consecutive_wins: max_consecutive(pnls, |p| p > 0.0),
            max_consecutive_losses: max_consecutive(pnls, |p| p < 0.0),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// (final - initial) / initial; 0.0 for a non-positive start.
pub fn total_return(initial: f64, final_equity: f64) -> f64 {
    if initial <= 0.0 {
        return 0.0;
    }
    (final_equity - initial) / initial
}

/// Compounds `total_return` over the calendar span `duration_ms`.
///
/// Spans of zero length return `total_return` unchanged. A wiped-out account
/// annualizes to -1.0.
pub fn annualized_return(total_return: f64, duration_ms: i64) -> f64 {
    if duration_ms <= 0 {
        return total_return;
    }
    let growth = 1.0 + total_return;
    if growth <= 0.0 {
        return -1.0;
    }
    let years = duration_ms as f64 / MS_PER_YEAR;
    growth.powf(1.0 / years) - 1.0
}

/// (mean(returns) - rf) / σ(returns). 0.0 when σ is zero.
pub fn sharpe_ratio(returns: &[f64], risk_free: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let std = std_dev(returns);
    if std < 1e-15 {
        return 0.0;
    }
    (mean_f64(returns) - risk_free) / std
}

/// (mean(returns) - target) / downside deviation.
///
/// The downside deviation is sqrt(mean((r - target)²)) over the returns
/// below `target` only. With no such returns the ratio is `f64::INFINITY`.
/// Empty input gives 0.0.
pub fn sortino_ratio(returns: &[f64], target: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let downside: Vec<f64> = returns
        .iter()
        .filter(|&&r| r < target)
        .map(|r| (r - target).powi(2))
        .collect();
    if downside.is_empty() {
        return f64::INFINITY;
    }
    let dd = mean_f64(&downside).sqrt();
    if dd < 1e-15 {
        return f64::INFINITY;
    }
    (mean_f64(returns) - target) / dd
}

/// Largest peak-to-trough decline, walking the curve with a running peak.
pub fn max_drawdown(equity_curve: &[f64]) -> MaxDrawdown {
    let mut worst = MaxDrawdown::default();
    let Some(&first) = equity_curve.first() else {
        return worst;
    };
    let (mut peak, mut peak_index) = (first, 0);
    for (i, &eq) in equity_curve.iter().enumerate() {
        if eq > peak {
            peak = eq;
            peak_index = i;
        }
        let amount = peak - eq;
        if amount > worst.amount {
            worst = MaxDrawdown {
                amount,
                fraction: if peak > 0.0 { amount / peak } else { 0.0 },
                peak_index,
                trough_index: i,
            };
        }
    }
    worst
}

/// Annualized return / max drawdown fraction.
///
/// Without a drawdown: `f64::INFINITY` for a positive return, 0.0 otherwise.
pub fn calmar_ratio(annualized_return: f64, max_drawdown_fraction: f64) -> f64 {
    if max_drawdown_fraction <= 0.0 {
        return if annualized_return > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };
    }
    annualized_return / max_drawdown_fraction
}

/// Gross profit / gross loss. `f64::INFINITY` with profit and no losses,
/// 0.0 with neither.
pub fn profit_factor(gross_profit: f64, gross_loss: f64) -> f64 {
    if gross_loss <= 0.0 {
        return if gross_profit > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };
    }
    gross_profit / gross_loss
}

/// Equity path implied by the trade stream, starting at `initial_capital`.
pub fn trade_equity_curve(trades: &[Trade], initial_capital: f64, final_equity: f64) -> Vec<f64> {
    let mut curve = Vec::with_capacity(trades.len() + 2);
    let mut equity = initial_capital;
    curve.push(equity);
    for t in trades {
        match (t.side, t.realized_pnl) {
            (_, Some(pnl)) => equity += pnl,
            (OrderSide::Buy, None) => equity -= t.commission,
            (OrderSide::Sell, None) => continue,
        }
        curve.push(equity);
    }
    if (final_equity - equity).abs() > 1e-9 * final_equity.abs().max(1.0) {
        curve.push(final_equity);
    }
    curve
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Simple period-over-period returns. Periods starting at a non-positive
/// value are skipped.
pub fn returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

pub fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean_f64(values);
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// JSON has no infinity, so infinite ratios travel as "inf" / "-inf".
mod unbounded {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
        if v.is_infinite() {
            s.serialize_str(if *v > 0.0 { "inf" } else { "-inf" })
        } else {
            s.serialize_f64(*v)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        match Repr::deserialize(d)? {
            Repr::Number(v) => Ok(v),
            Repr::Text(t) => match t.as_str() {
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                other => Err(de::Error::custom(format!("invalid ratio: {other}"))),
            },
        }
    }
}

fn max_consecutive(pnls: &[f64], pred: impl Fn(f64) -> bool) -> usize {
    let mut best = 0;
    let mut run = 0;
    for &p in pnls {
        if pred(p) {
            run += 1;
            best = best.max(run);
        } else {
            run = 0;
        }
    }
    best
}
