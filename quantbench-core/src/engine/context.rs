//! Strategy context — what a strategy can see on each bar.
//!
//! Owned by the engine and rebuilt per run. Strategies get `&mut` access
//! only during `initialize` (to register indicators); afterwards they see it
//! read-only.

use crate::domain::{Bar, Position, Timeframe};
use crate::indicators::{IndicatorSet, RollingWindow};
use crate::ledger::PortfolioSnapshot;
use crate::risk::RiskLimits;

#[derive(Debug)]
pub struct StrategyContext {
    symbol: String,
    timeframe: Timeframe,
    bars: RollingWindow<Bar>,
    indicators: IndicatorSet,
    portfolio: PortfolioSnapshot,
    risk_limits: RiskLimits,
    bar_index: usize,
    bars_seen: usize,
}

impl StrategyContext {
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        history_limit: usize,
        portfolio: PortfolioSnapshot,
        risk_limits: RiskLimits,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            bars: RollingWindow::new(history_limit.max(1)),
            indicators: IndicatorSet::new(),
            portfolio,
            risk_limits,
            bar_index: 0,
            bars_seen: 0,
        }
    }

    /// Append a bar and feed it to every registered indicator.
    pub(crate) fn advance(&mut self, bar: &Bar, index: usize) {
        self.bars.push(bar.clone());
        self.indicators.update_all(bar);
        self.bar_index = index;
        self.bars_seen += 1;
    }

    pub(crate) fn set_portfolio(&mut self, portfolio: PortfolioSnapshot) {
        self.portfolio = portfolio;
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn current_bar(&self) -> Option<&Bar> {
        self.bars.latest()
    }

    /// Retained bars, oldest first.
    pub fn bars(&self) -> impl Iterator<Item = &Bar> {
        self.bars.iter()
    }

    /// Up to `n` most recent bars, oldest first.
    pub fn recent_bars(&self, n: usize) -> Vec<&Bar> {
        let skip = self.bars.len().saturating_sub(n);
        self.bars.iter().skip(skip).collect()
    }

    /// Index of the current bar in the run's bar sequence.
    pub fn bar_index(&self) -> usize {
        self.bar_index
    }

    /// Total bars processed so far, including ones evicted from history.
    pub fn bars_seen(&self) -> usize {
        self.bars_seen
    }

    pub fn indicators(&self) -> &IndicatorSet {
        &self.indicators
    }

    pub fn indicators_mut(&mut self) -> &mut IndicatorSet {
        &mut self.indicators
    }

    pub fn portfolio(&self) -> &PortfolioSnapshot {
        &self.portfolio
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.portfolio.position(symbol)
    }

    pub fn risk_limits(&self) -> &RiskLimits {
        &self.risk_limits
    }

    /// True once every registered indicator has enough history.
    pub fn is_warm(&self) -> bool {
        self.bars_seen >= self.indicators.max_required_candles()
    }
}
