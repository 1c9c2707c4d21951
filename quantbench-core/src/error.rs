//! Error and rejection types for the simulation core.
//!
//! Insufficient history is not an error: indicators return `None`. Everything
//! else is one of the types below.

use thiserror::Error;

/// Invalid construction parameters. Raised before any bar is processed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{component}: {param} must be >= 1, got {value}")]
    ZeroPeriod {
        component: &'static str,
        param: &'static str,
        value: usize,
    },
    #[error("{component}: {param} must be positive and finite, got {value}")]
    NonPositive {
        component: &'static str,
        param: &'static str,
        value: f64,
    },
    #[error("{component}: fast period ({fast}) must be shorter than slow period ({slow})")]
    PeriodOrder {
        component: &'static str,
        fast: usize,
        slow: usize,
    },
    #[error("{field} = {value} is outside the allowed range {min}..{max}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("initial capital must be positive and finite, got {0}")]
    InvalidCapital(f64),
    #[error("invalid risk limits: {0}")]
    RiskLimits(String),
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
}

/// Problems with the bar sequence handed to the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("bar sequence is empty")]
    Empty,
    #[error("bar {index} timestamp {current} is not after previous {previous}")]
    NonMonotonic {
        index: usize,
        previous: String,
        current: String,
    },
    #[error("bar {index} has symbol '{found}', expected '{expected}'")]
    MixedSymbols {
        index: usize,
        expected: String,
        found: String,
    },
    #[error("bar {index} has invalid OHLC values")]
    InvalidBar { index: usize },
    #[error("no bars loaded for {symbol} {timeframe}")]
    SymbolNotFound { symbol: String, timeframe: String },
}

/// A trade the ledger refuses to book. Order validation should make these
/// unreachable from the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("no open position in {0}")]
    NoPosition(String),
    #[error("cannot sell {requested} of {symbol}: only {held} held")]
    InsufficientPosition {
        symbol: String,
        requested: f64,
        held: f64,
    },
    #[error("trade quantity must be positive and finite, got {0}")]
    InvalidQuantity(f64),
    #[error("trade price must be positive and finite, got {0}")]
    InvalidPrice(f64),
}

/// Why an order was turned away. Returned from validation, never raised.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("quantity must be positive and finite, got {0}")]
    InvalidQuantity(f64),
    #[error("price must be positive and finite, got {0}")]
    InvalidPrice(f64),
    #[error("signal symbol '{signal}' does not match bar symbol '{bar}'")]
    SymbolMismatch { signal: String, bar: String },
    #[error("insufficient cash: need {required:.2}, have {available:.2}")]
    InsufficientCash { required: f64, available: f64 },
    #[error("no open position in {0}")]
    NoPosition(String),
    #[error("cannot sell {requested} of {symbol}: only {held} held")]
    InsufficientPosition {
        symbol: String,
        requested: f64,
        held: f64,
    },
    #[error("short selling is not supported ({0})")]
    ShortNotSupported(String),
    #[error("max open positions reached ({0})")]
    MaxPositions(usize),
    #[error("position value {value:.2} exceeds limit {limit:.2}")]
    PositionTooLarge { value: f64, limit: f64 },
    #[error("order notional {value:.2} below minimum {min:.2}")]
    PositionTooSmall { value: f64, min: f64 },
    #[error("portfolio exposure {exposure:.4} would exceed limit {limit:.4}")]
    PortfolioRisk { exposure: f64, limit: f64 },
    #[error("drawdown {drawdown:.4} at or beyond ceiling {limit:.4}")]
    DrawdownCeiling { drawdown: f64, limit: f64 },
    #[error("sizing produced no tradable quantity")]
    ZeroSize,
}

/// Errors that abort a backtest run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("strategy '{name}' failed to initialize: {reason}")]
    StrategyInit { name: String, reason: String },
    #[error("backtest already complete")]
    AlreadyComplete,
}
