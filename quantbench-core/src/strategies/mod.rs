//! Example strategies built on the indicator registry.

pub mod ma_crossover;
pub mod rsi_reversion;

pub use ma_crossover::MaCrossover;
pub use rsi_reversion::RsiReversion;
