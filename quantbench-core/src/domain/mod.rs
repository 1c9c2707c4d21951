//! Domain types for QuantBench

pub mod bar;
pub mod ids;
pub mod order;
pub mod position;
pub mod trade;

pub use bar::{Bar, PriceSource, Timeframe};
pub use ids::{IdGen, OrderId, TradeId};
pub use order::{Order, OrderRequest, OrderSide, OrderStatus};
pub use position::{Position, PositionSide};
pub use trade::Trade;

/// Symbol type alias
pub type Symbol = String;
