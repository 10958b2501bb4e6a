//! Data records and storage for order-flow aggregation.
//!
//! This crate provides:
//! - Trade and candle records, including the footprint fields attached to candles
//! - CSV storage utilities

pub mod csv_storage;
pub mod models;

pub use csv_storage::{parse_timestamp, CsvStorage};

pub use models::{
    CandleOrderflow, CandleRecord, ImbalanceTable, LevelImbalance, PriceLevel, TradeRecord,
    VolumeProfile,
};
