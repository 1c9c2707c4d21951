//! Parameter sweeps — run a grid of configurations over the same bars.
//!
//! Each job builds its own strategy, engine and ledger, so jobs share nothing
//! but the read-only bar slice and run in parallel under rayon.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::info;

use quantbench_core::domain::Bar;

use crate::config::{BacktestConfig, StrategyConfig};
use crate::runner::{run_backtest, BacktestReport, RunError};

/// Parameter grid for sweeps.
///
/// The Cartesian product of `strategies` and `initial_capitals` is run. An
/// empty `initial_capitals` keeps the base config's capital.
#[derive(Debug, Clone, Default)]
pub struct ParamGrid {
    pub strategies: Vec<StrategyConfig>,
    pub initial_capitals: Vec<f64>,
}

impl ParamGrid {
    /// Every fast/slow pair with fast < slow.
    pub fn ma_crossover(fast_periods: &[usize], slow_periods: &[usize]) -> Self {
        let strategies = fast_periods
            .iter()
            .flat_map(|&fast| {
                slow_periods
                    .iter()
                    .filter(move |&&slow| fast < slow)
                    .map(move |&slow| StrategyConfig::MaCrossover {
                        fast_period: fast,
                        slow_period: slow,
                    })
            })
            .collect();
        Self {
            strategies,
            initial_capitals: Vec::new(),
        }
    }

    /// Every period with every (oversold, overbought) band where
    /// oversold < overbought.
    pub fn rsi_reversion(periods: &[usize], bands: &[(f64, f64)]) -> Self {
        let strategies = periods
            .iter()
            .flat_map(|&period| {
                bands
                    .iter()
                    .filter(|(lo, hi)| lo < hi)
                    .map(move |&(oversold, overbought)| StrategyConfig::RsiReversion {
                        period,
                        oversold,
                        overbought,
                    })
            })
            .collect();
        Self {
            strategies,
            initial_capitals: Vec::new(),
        }
    }

    pub fn with_capitals(mut self, capitals: Vec<f64>) -> Self {
        self.initial_capitals = capitals;
        self
    }

    /// Number of configs `generate_configs` will produce.
    pub fn size(&self) -> usize {
        self.strategies.len() * self.initial_capitals.len().max(1)
    }

    pub fn generate_configs(&self, base: &BacktestConfig) -> Vec<BacktestConfig> {
        let capitals: Vec<f64> = if self.initial_capitals.is_empty() {
            vec![base.backtest.initial_capital]
        } else {
            self.initial_capitals.clone()
        };
        let mut configs = Vec::with_capacity(self.size());
        for strategy in &self.strategies {
            for &capital in &capitals {
                let mut config = base.clone().with_strategy(strategy.clone());
                config.backtest.initial_capital = capital;
                configs.push(config);
            }
        }
        configs
    }
}

/// Runs grids sequentially or in parallel.
#[derive(Debug, Clone)]
pub struct ParamSweep {
    parallel: bool,
}

impl Default for ParamSweep {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamSweep {
    pub fn new() -> Self {
        Self { parallel: true }
    }

    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Runs every config in the grid. The first failing config aborts the
    /// sweep with its error.
    pub fn sweep(
        &self,
        grid: &ParamGrid,
        base: &BacktestConfig,
        bars: &[Bar],
    ) -> Result<SweepResults, RunError> {
        self.sweep_with_progress(grid, base, bars, |_, _, _| {})
    }

    /// Like `sweep`, invoking `progress(index, total, report)` after each
    /// run. Under parallel execution the calls arrive out of order.
    pub fn sweep_with_progress<F>(
        &self,
        grid: &ParamGrid,
        base: &BacktestConfig,
        bars: &[Bar],
        progress: F,
    ) -> Result<SweepResults, RunError>
    where
        F: Fn(usize, usize, &BacktestReport) + Send + Sync,
    {
        let configs = grid.generate_configs(base);
        let total = configs.len();
        info!(
            "Sweeping {} configs over {} bars (parallel={})",
            total,
            bars.len(),
            self.parallel
        );

        let job = |(idx, config): (usize, &BacktestConfig)| -> Result<BacktestReport, RunError> {
            let report = run_backtest(config, bars.to_vec())?;
            progress(idx, total, &report);
            Ok(report)
        };
        let reports = if self.parallel {
            configs
                .par_iter()
                .enumerate()
                .map(job)
                .collect::<Result<Vec<_>, RunError>>()?
        } else {
            configs
                .iter()
                .enumerate()
                .map(job)
                .collect::<Result<Vec<_>, RunError>>()?
        };

        Ok(SweepResults::new(reports))
    }
}

/// Reports from a sweep, in grid order.
#[derive(Debug)]
pub struct SweepResults {
    reports: Vec<BacktestReport>,
    by_run_id: HashMap<String, usize>,
}

impl SweepResults {
    fn new(reports: Vec<BacktestReport>) -> Self {
        let by_run_id = reports
            .iter()
            .enumerate()
            .map(|(i, r)| (r.run_id.clone(), i))
            .collect();
        Self { reports, by_run_id }
    }

    pub fn all(&self) -> &[BacktestReport] {
        &self.reports
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn get(&self, run_id: &str) -> Option<&BacktestReport> {
        self.by_run_id.get(run_id).map(|&i| &self.reports[i])
    }

    /// Reports sorted by `key`, descending.
    pub fn sorted_by<K>(&self, key: K) -> Vec<&BacktestReport>
    where
        K: Fn(&BacktestReport) -> f64,
    {
        let mut sorted: Vec<_> = self.reports.iter().collect();
        sorted.sort_by(|a, b| key(b).total_cmp(&key(a)));
        sorted
    }

    pub fn sorted_by_sharpe(&self) -> Vec<&BacktestReport> {
        self.sorted_by(|r| r.metrics.annualized_sharpe)
    }

    pub fn top_n(&self, n: usize) -> Vec<&BacktestReport> {
        self.sorted_by_sharpe().into_iter().take(n).collect()
    }

    pub fn best(&self) -> Option<&BacktestReport> {
        self.sorted_by_sharpe().into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quantbench_core::data::SyntheticBars;
    use quantbench_core::domain::Timeframe;

    fn bars() -> Vec<Bar> {
        SyntheticBars::new("SPY", Timeframe::OneDay)
            .seed(21)
            .volatility(0.025)
            .generate(300)
    }

    #[test]
    fn test_param_grid_filters_invalid_combinations() {
        let grid = ParamGrid::ma_crossover(&[10, 50, 100], &[50, 100]);
        // (10,50), (10,100), (50,100)
        assert_eq!(grid.size(), 3);
        for config in grid.generate_configs(&BacktestConfig::default()) {
            match config.strategy {
                StrategyConfig::MaCrossover {
                    fast_period,
                    slow_period,
                } => assert!(fast_period < slow_period),
                other => panic!("unexpected strategy {other:?}"),
            }
        }
    }

    #[test]
    fn test_param_grid_size_with_capitals() {
        let grid = ParamGrid::ma_crossover(&[5, 10], &[20, 40]).with_capitals(vec![1e4, 1e5]);
        assert_eq!(grid.size(), 8);
        assert_eq!(grid.generate_configs(&BacktestConfig::default()).len(), 8);
    }

    #[test]
    fn test_rsi_grid_skips_inverted_bands() {
        let grid = ParamGrid::rsi_reversion(&[7, 14], &[(30.0, 70.0), (80.0, 20.0)]);
        assert_eq!(grid.size(), 2);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let grid = ParamGrid::ma_crossover(&[5, 10], &[20, 40]);
        let base = BacktestConfig::default();
        let bars = bars();
        let par = ParamSweep::new().sweep(&grid, &base, &bars).unwrap();
        let seq = ParamSweep::new()
            .with_parallelism(false)
            .sweep(&grid, &base, &bars)
            .unwrap();
        assert_eq!(par.len(), 4);
        for (a, b) in par.all().iter().zip(seq.all()) {
            assert_eq!(a.run_id, b.run_id);
            assert_eq!(a.metrics, b.metrics);
        }
    }

    #[test]
    fn test_sorted_descending_and_lookup() {
        let grid = ParamGrid::ma_crossover(&[5, 10], &[20, 40]);
        let results = ParamSweep::new()
            .sweep(&grid, &BacktestConfig::default(), &bars())
            .unwrap();
        let sorted = results.sorted_by_sharpe();
        for pair in sorted.windows(2) {
            assert!(pair[0].metrics.annualized_sharpe >= pair[1].metrics.annualized_sharpe);
        }
        let best = results.best().unwrap();
        assert_eq!(results.get(&best.run_id).unwrap().run_id, best.run_id);
        assert_eq!(results.top_n(2).len(), 2);
    }

    #[test]
    fn test_progress_called_for_every_config() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let calls = AtomicUsize::new(0);
        let grid = ParamGrid::ma_crossover(&[5], &[20, 30, 40]);
        ParamSweep::new()
            .sweep_with_progress(&grid, &BacktestConfig::default(), &bars(), |_, total, _| {
                assert_eq!(total, 3);
                calls.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_invalid_config_aborts_sweep() {
        let grid = ParamGrid {
            strategies: vec![StrategyConfig::MaCrossover {
                fast_period: 0,
                slow_period: 10,
            }],
            initial_capitals: Vec::new(),
        };
        let err = ParamSweep::new()
            .sweep(&grid, &BacktestConfig::default(), &bars())
            .unwrap_err();
        assert!(matches!(err, RunError::Config(_)));
    }
}
