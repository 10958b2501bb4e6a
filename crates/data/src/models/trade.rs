//! Trade execution records.
//!
//! Side labels come straight from the exchange. A taker sell consumes resting
//! bids, a taker buy consumes resting asks, so `sell` trades are counted as
//! bid-side volume and `buy` trades as ask-side volume.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single trade execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Execution timestamp
    pub timestamp: DateTime<Utc>,
    /// Exchange trade id, if the source provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Execution price
    pub price: Decimal,
    /// Executed amount in base currency
    pub amount: Decimal,
    /// Raw side label as reported by the exchange
    pub side: String,
}

impl TradeRecord {
    pub fn new(timestamp: DateTime<Utc>, price: Decimal, amount: Decimal, side: &str) -> Self {
        Self {
            timestamp,
            id: None,
            price,
            amount,
            side: side.to_string(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Returns true if the side label marks bid-side volume (a sell).
    ///
    /// Labels are matched by substring, so `"market_sell"` counts too. A label
    /// containing both words counts on both sides.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use footprint_data::TradeRecord;
    /// use rust_decimal::Decimal;
    ///
    /// let trade = TradeRecord::new(Utc::now(), Decimal::ONE_HUNDRED, Decimal::ONE, "market_sell");
    /// assert!(trade.is_bid());
    /// assert!(!trade.is_ask());
    /// ```
    #[must_use]
    pub fn is_bid(&self) -> bool {
        self.side.contains("sell")
    }

    /// Returns true if the side label marks ask-side volume (a buy).
    #[must_use]
    pub fn is_ask(&self) -> bool {
        self.side.contains("buy")
    }

    /// Amount contributed to bid-side volume (zero unless a sell).
    #[must_use]
    pub fn bid_amount(&self) -> Decimal {
        if self.is_bid() {
            self.amount
        } else {
            Decimal::ZERO
        }
    }

    /// Amount contributed to ask-side volume (zero unless a buy).
    #[must_use]
    pub fn ask_amount(&self) -> Decimal {
        if self.is_ask() {
            self.amount
        } else {
            Decimal::ZERO
        }
    }

    /// Ask amount minus bid amount.
    #[must_use]
    pub fn signed_volume(&self) -> Decimal {
        self.ask_amount() - self.bid_amount()
    }
}
