//! Order-flow aggregation for OHLCV candles.
//!
//! This crate provides:
//! - Volume profile construction from raw trades (`volume_profile`)
//! - Diagonal bid/ask imbalance detection (`imbalance`)
//! - Stacked imbalance scanning (`stacked`)
//! - An insertion-ordered cache of finished candles (`cache`)
//! - The aggregation pass tying them together (`aggregator`)

pub mod aggregator;
pub mod cache;
pub mod error;
pub mod imbalance;
pub mod stacked;
pub mod volume_profile;

pub use aggregator::{populate_candles_with_trades, OrderflowAggregator, PopulateSummary};
pub use cache::{IntervalCache, IntervalKey};
pub use error::{OrderflowError, Result};
pub use imbalance::{exceeds_ratio, ImbalanceDetector};
pub use stacked::{stacked_imbalance, ScanDirection, StackedImbalanceScanner};
pub use volume_profile::{bin_price, build_volume_profile, VolumeProfileBuilder};
