//! Footprint data models: per-price volume profile and imbalance table.
//!
//! Both maps are keyed by the binned price and iterate in ascending price
//! order. They are built once per candle and never mutated afterwards.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregated flow at a single price bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceLevel {
    /// Volume of sells (bid-side liquidity consumed)
    pub bid_amount: Decimal,
    /// Volume of buys (ask-side liquidity consumed)
    pub ask_amount: Decimal,
    /// Number of sells
    pub bid_count: usize,
    /// Number of buys
    pub ask_count: usize,
    /// ask_amount - bid_amount
    pub delta: Decimal,
    /// ask_amount + bid_amount
    pub total_volume: Decimal,
    /// ask_count + bid_count
    pub total_trades: usize,
}

impl PriceLevel {
    /// Creates a level from its raw sums, deriving delta and totals.
    ///
    /// Returns `None` if a derived value leaves the decimal range.
    #[must_use]
    pub fn new(
        bid_amount: Decimal,
        ask_amount: Decimal,
        bid_count: usize,
        ask_count: usize,
    ) -> Option<Self> {
        Some(Self {
            bid_amount,
            ask_amount,
            bid_count,
            ask_count,
            delta: ask_amount.checked_sub(bid_amount)?,
            total_volume: ask_amount.checked_add(bid_amount)?,
            total_trades: ask_count.checked_add(bid_count)?,
        })
    }
}

/// Price-binned volume distribution of one candle.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VolumeProfile {
    levels: BTreeMap<Decimal, PriceLevel>,
}

impl VolumeProfile {
    #[must_use]
    pub fn from_levels(levels: BTreeMap<Decimal, PriceLevel>) -> Self {
        Self { levels }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    #[must_use]
    pub fn get(&self, price: Decimal) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    /// Iterates `(price, level)` in ascending price order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (Decimal, &PriceLevel)> + ExactSizeIterator {
        self.levels.iter().map(|(price, level)| (*price, level))
    }

    pub fn prices(&self) -> impl DoubleEndedIterator<Item = Decimal> + '_ {
        self.levels.keys().copied()
    }

    /// Total traded volume, `None` for an empty profile or on overflow.
    #[must_use]
    pub fn total_volume(&self) -> Option<Decimal> {
        self.summarize(|level| level.total_volume)
    }

    /// Net delta across all bins, `None` for an empty profile or on overflow.
    #[must_use]
    pub fn delta(&self) -> Option<Decimal> {
        self.summarize(|level| level.delta)
    }

    fn summarize(&self, field: impl Fn(&PriceLevel) -> Decimal) -> Option<Decimal> {
        let mut values = self.levels.values().map(field);
        let first = values.next()?;
        values.try_fold(first, Decimal::checked_add)
    }
}

/// Imbalance flags for a single price bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LevelImbalance {
    pub bid_imbalance: bool,
    pub ask_imbalance: bool,
}

/// Imbalance flags aligned with the bins of a [`VolumeProfile`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImbalanceTable {
    levels: BTreeMap<Decimal, LevelImbalance>,
}

impl ImbalanceTable {
    #[must_use]
    pub fn from_levels(levels: BTreeMap<Decimal, LevelImbalance>) -> Self {
        Self { levels }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    #[must_use]
    pub fn get(&self, price: Decimal) -> Option<&LevelImbalance> {
        self.levels.get(&price)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (Decimal, &LevelImbalance)> {
        self.levels.iter().map(|(price, flags)| (*price, flags))
    }

    /// Bid flags in ascending price order.
    #[must_use]
    pub fn bid_flags(&self) -> Vec<(Decimal, bool)> {
        self.iter().map(|(price, f)| (price, f.bid_imbalance)).collect()
    }

    /// Ask flags in ascending price order.
    #[must_use]
    pub fn ask_flags(&self) -> Vec<(Decimal, bool)> {
        self.iter().map(|(price, f)| (price, f.ask_imbalance)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn profile(levels: &[(Decimal, PriceLevel)]) -> VolumeProfile {
        VolumeProfile::from_levels(levels.iter().copied().collect())
    }

    fn level(bid: Decimal, ask: Decimal, bid_count: usize, ask_count: usize) -> PriceLevel {
        PriceLevel::new(bid, ask, bid_count, ask_count).unwrap()
    }

    #[test]
    fn test_price_level_derives_totals() {
        let level = level(dec!(1), dec!(2), 1, 1);
        assert_eq!(level.delta, dec!(1));
        assert_eq!(level.total_volume, dec!(3));
        assert_eq!(level.total_trades, 2);
    }

    #[test]
    fn test_price_level_rejects_overflowing_totals() {
        assert_eq!(PriceLevel::new(Decimal::MAX, Decimal::MAX, 1, 1), None);
        assert_eq!(PriceLevel::new(Decimal::MAX, Decimal::MIN, 1, 1), None);
        assert!(PriceLevel::new(Decimal::MAX, Decimal::ZERO, 1, 0).is_some());
    }

    #[test]
    fn test_summaries_are_unset_on_overflow() {
        let p = profile(&[
            (dec!(100), level(Decimal::ZERO, Decimal::MAX, 0, 1)),
            (dec!(101), level(Decimal::ZERO, Decimal::MAX, 0, 1)),
        ]);
        assert_eq!(p.total_volume(), None);
        assert_eq!(p.delta(), None);
    }

    #[test]
    fn test_empty_profile_summaries_are_unset() {
        let empty = VolumeProfile::default();
        assert!(empty.is_empty());
        assert_eq!(empty.total_volume(), None);
        assert_eq!(empty.delta(), None);
    }

    #[test]
    fn test_profile_iterates_ascending() {
        let p = profile(&[
            (dec!(101), level(dec!(0), dec!(1), 0, 1)),
            (dec!(99), level(dec!(2), dec!(0), 1, 0)),
            (dec!(100), level(dec!(1), dec!(1), 1, 1)),
        ]);
        let prices: Vec<Decimal> = p.prices().collect();
        assert_eq!(prices, vec![dec!(99), dec!(100), dec!(101)]);
        assert_eq!(p.total_volume(), Some(dec!(5)));
        assert_eq!(p.delta(), Some(dec!(-1)));
    }

    #[test]
    fn test_profile_serializes_as_price_keyed_map() {
        let p = profile(&[(dec!(100.5), level(dec!(0), dec!(5), 0, 1))]);
        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("100.5").is_some());
        let back: VolumeProfile = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_flag_extraction_keeps_order() {
        let table = ImbalanceTable::from_levels(
            [
                (dec!(1), LevelImbalance { bid_imbalance: true, ask_imbalance: false }),
                (dec!(2), LevelImbalance { bid_imbalance: false, ask_imbalance: true }),
            ]
            .into_iter()
            .collect(),
        );
        assert_eq!(table.bid_flags(), vec![(dec!(1), true), (dec!(2), false)]);
        assert_eq!(table.ask_flags(), vec![(dec!(1), false), (dec!(2), true)]);
    }
}
