//! Datafeed contract and the sources that ship with the core.
//!
//! The engine itself only sees a `Vec<Bar>`; a `BarSource` is how callers
//! get one.

pub mod memory;
pub mod synthetic;

use chrono::{DateTime, Utc};

use crate::domain::{Bar, Timeframe};
use crate::error::DataError;

pub use memory::InMemoryBarSource;
pub use synthetic::SyntheticBars;

/// Anything that can hand out ordered bars for a symbol and timeframe.
pub trait BarSource {
    /// Bars with `start <= timestamp < end`, ascending.
    fn bars_in_range(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, DataError>;

    /// The last `n` bars (fewer if not that many exist), ascending.
    fn recent_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        n: usize,
    ) -> Result<Vec<Bar>, DataError>;
}
