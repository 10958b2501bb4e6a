//! Candle records enriched with order-flow fields.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::footprint::{ImbalanceTable, VolumeProfile};
use super::trade::TradeRecord;

/// Order-flow fields attached to a candle.
///
/// Every field is `None` until the candle has been matched with trades. An
/// unset field means "no data", which is distinct from a zero value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CandleOrderflow {
    /// Raw trades of the candle in arrival order
    pub trades: Option<Vec<TradeRecord>>,
    /// Price-binned volume profile
    pub orderflow: Option<VolumeProfile>,
    /// Diagonal imbalance flags per bin
    pub imbalances: Option<ImbalanceTable>,
    /// Lowest price where a stacked bid imbalance run qualifies
    pub stacked_imbalances_bid: Option<Decimal>,
    /// Highest price where a stacked ask imbalance run qualifies
    pub stacked_imbalances_ask: Option<Decimal>,
    /// Maximum of the running per-trade delta
    pub max_delta: Option<Decimal>,
    /// Minimum of the running per-trade delta
    pub min_delta: Option<Decimal>,
    /// Total bid-side (sell) volume
    pub bid: Option<Decimal>,
    /// Total ask-side (buy) volume
    pub ask: Option<Decimal>,
    /// ask - bid
    pub delta: Option<Decimal>,
    /// Number of trades in the candle
    pub total_trades: Option<usize>,
}

impl CandleOrderflow {
    /// Returns true if no field has been populated.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        *self == Self::default()
    }
}

/// An OHLCV candle plus its order-flow fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleRecord {
    /// Candle open time
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    #[serde(default)]
    pub orderflow: CandleOrderflow,
}

impl CandleRecord {
    /// Creates a candle with unset order-flow fields.
    pub fn new(
        timestamp: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            orderflow: CandleOrderflow::default(),
        }
    }

    /// Clears all order-flow fields back to unset.
    pub fn reset_orderflow(&mut self) {
        self.orderflow = CandleOrderflow::default();
    }
}
