//! Backtest runner — wires together config, engine, and metrics.
//!
//! Two entry points:
//! - `run_backtest()`: takes pre-loaded bars. Used by sweeps and tests.
//! - `run_from_source()`: pulls the configured series from a `BarSource`
//!   over a half-open time range, then runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use quantbench_core::data::BarSource;
use quantbench_core::domain::Bar;
use quantbench_core::engine::{BacktestEngine, BacktestResults};
use quantbench_core::error::{ConfigError, DataError, EngineError};

use crate::config::{BacktestConfig, RunId};
use crate::metrics::{returns, PerformanceMetrics};
use crate::tail_metrics::TailMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("bars are for '{found}', config expects '{expected}'")]
    SymbolMismatch { expected: String, found: String },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to write config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub config: BacktestConfig,
    pub results: BacktestResults,
    pub metrics: PerformanceMetrics,
    pub tail: TailMetrics,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestReport {
    pub fn strategy_name(&self) -> &str {
        &self.results.summary.strategy
    }
}

/// Run one backtest over `bars`, which must all belong to the configured
/// symbol.
pub fn run_backtest(config: &BacktestConfig, bars: Vec<Bar>) -> Result<BacktestReport, RunError> {
    config.validate()?;
    let expected = &config.backtest.symbol;
    if let Some(bar) = bars.iter().find(|b| &b.symbol != expected) {
        return Err(RunError::SymbolMismatch {
            expected: expected.clone(),
            found: bar.symbol.clone(),
        });
    }
    let run_id = config.run_id()?;

    let strategy = config.build_strategy()?;
    let mut engine = BacktestEngine::new(config.to_engine_config(), bars, strategy)?;
    engine.run()?;
    let results = engine.results();

    let options = config.metrics_options();
    let curve = results.equity_values();
    let metrics = PerformanceMetrics::from_curve(
        &curve,
        &results.trades,
        results.summary.duration_ms,
        &options,
    );
    let tail = TailMetrics::compute(&returns(&curve), options.var_confidence);

    info!(
        "Run {} complete: return={:.4} sharpe={:.3} max_dd={:.4} trades={}",
        run_id.get(..12).unwrap_or(&run_id),
        metrics.total_return,
        metrics.annualized_sharpe,
        metrics.max_drawdown.fraction,
        metrics.trades.total_trades
    );

    Ok(BacktestReport {
        schema_version: SCHEMA_VERSION,
        run_id,
        config: config.clone(),
        results,
        metrics,
        tail,
    })
}

/// Load `[start, end)` of the configured series from `source` and run.
pub fn run_from_source(
    config: &BacktestConfig,
    source: &dyn BarSource,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<BacktestReport, RunError> {
    let bars = source.bars_in_range(
        &config.backtest.symbol,
        config.backtest.timeframe,
        start,
        end,
    )?;
    run_backtest(config, bars)
}
