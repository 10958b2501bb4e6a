//! Data models for order-flow aggregation.
//!
//! All models use `rust_decimal::Decimal` for financial precision.

pub mod candle;
pub mod footprint;
pub mod trade;

pub use candle::{CandleOrderflow, CandleRecord};
pub use footprint::{ImbalanceTable, LevelImbalance, PriceLevel, VolumeProfile};
pub use trade::TradeRecord;
