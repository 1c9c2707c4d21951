//! QuantBench Runner — run configuration, analytics, reports, sweeps.
//!
//! This crate builds on `quantbench-core` to provide:
//! - TOML run configuration with content-addressed run ids
//! - Single-backtest runner producing a `BacktestReport`
//! - Performance metrics (Sharpe, Sortino, Calmar, drawdown, trade stats)
//! - Tail risk (historical VaR / CVaR, skew, kurtosis)
//! - Plain-text report formatting and JSON/CSV export
//! - Parallel parameter sweeps

pub mod config;
pub mod export;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod sweep;
pub mod tail_metrics;

pub use config::{BacktestConfig, RunId, StrategyConfig};
pub use export::{export_equity_csv, export_json, export_trades_csv, import_json, save_artifacts};
pub use metrics::{MaxDrawdown, MetricsOptions, PerformanceMetrics, TradeStats};
pub use report::{format_report, Summary, TradeTable};
pub use runner::{run_backtest, run_from_source, BacktestReport, RunError};
pub use sweep::{ParamGrid, ParamSweep, SweepResults};
pub use tail_metrics::TailMetrics;
