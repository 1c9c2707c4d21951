//! QuantBench Core — indicators, ledger, risk, fill simulation, backtest loop.
//!
//! This crate contains the simulation core:
//! - Domain types (bars, orders, trades, positions)
//! - Streaming technical indicators with batch/incremental agreement
//! - Portfolio ledger with cash reconciliation checked on every mutation
//! - Risk limits and position sizing over ledger snapshots
//! - Deterministic fill simulation (slippage, commission)
//! - Bar-by-bar backtest loop driving a `Strategy` trait object
//! - Datafeed contract with in-memory and synthetic sources

pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod execution;
pub mod indicators;
pub mod ledger;
pub mod risk;
pub mod sizing;
pub mod strategies;

pub use engine::{BacktestEngine, BacktestResults, EngineConfig, Signal, Strategy, StrategyContext};
pub use error::{ConfigError, DataError, EngineError, LedgerError, Rejection};
