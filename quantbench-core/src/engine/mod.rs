//! Backtest loop, strategy contract and run results.

pub mod backtest;
pub mod config;
pub mod context;
pub mod results;
pub mod strategy;

pub use backtest::{validate_bars, BacktestEngine, BacktestPhase};
pub use config::EngineConfig;
pub use context::StrategyContext;
pub use results::{BacktestResults, BacktestSummary, EquityPoint};
pub use strategy::{Signal, Strategy};
