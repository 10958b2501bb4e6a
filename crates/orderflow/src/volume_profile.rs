//! Volume profile construction.
//!
//! Each trade is attributed to a price bin `round(price / scale) * scale`
//! (banker's rounding) and its amount is added to the bid or ask side of that
//! bin depending on the trade's side label.

use crate::error::{OrderflowError, Result};
use footprint_data::{PriceLevel, TradeRecord, VolumeProfile};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;

/// Rounds a price to the nearest multiple of `scale`, ties to even.
///
/// # Errors
/// Returns `InvalidScale` if `scale` is not positive, `Overflow` if the
/// division or multiplication leaves the decimal range.
pub fn bin_price(price: Decimal, scale: Decimal) -> Result<Decimal> {
    if scale <= Decimal::ZERO {
        return Err(OrderflowError::InvalidScale(scale));
    }
    let steps = price
        .checked_div(scale)
        .ok_or(OrderflowError::Overflow("binning price"))?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
    steps
        .checked_mul(scale)
        .map(|binned| binned.normalize())
        .ok_or(OrderflowError::Overflow("binning price"))
}

#[derive(Default)]
struct LevelSums {
    bid_amount: Decimal,
    ask_amount: Decimal,
    bid_count: usize,
    ask_count: usize,
}

/// Builds per-candle volume profiles at a fixed bin width.
#[derive(Debug, Clone, Copy)]
pub struct VolumeProfileBuilder {
    scale: Decimal,
}

impl VolumeProfileBuilder {
    /// Creates a builder for the given bin width.
    ///
    /// # Errors
    /// Returns `InvalidScale` if `scale` is not positive.
    pub fn new(scale: Decimal) -> Result<Self> {
        if scale <= Decimal::ZERO {
            return Err(OrderflowError::InvalidScale(scale));
        }
        Ok(Self { scale })
    }

    /// Bins `trades` into a profile ordered by ascending price.
    ///
    /// An empty trade list gives an empty profile whose summaries are unset.
    ///
    /// # Errors
    /// Returns `Overflow` if a bin, a sum or a level total leaves the decimal
    /// range.
    pub fn build(&self, trades: &[TradeRecord]) -> Result<VolumeProfile> {
        let mut sums: BTreeMap<Decimal, LevelSums> = BTreeMap::new();

        for trade in trades {
            let bin = bin_price(trade.price, self.scale)?;
            let level = sums.entry(bin).or_default();

            level.bid_amount = level
                .bid_amount
                .checked_add(trade.bid_amount())
                .ok_or(OrderflowError::Overflow("summing bid volume"))?;
            level.ask_amount = level
                .ask_amount
                .checked_add(trade.ask_amount())
                .ok_or(OrderflowError::Overflow("summing ask volume"))?;
            level.bid_count += usize::from(trade.is_bid());
            level.ask_count += usize::from(trade.is_ask());
        }

        let levels: BTreeMap<Decimal, PriceLevel> = sums
            .into_iter()
            .map(|(price, s)| {
                PriceLevel::new(s.bid_amount, s.ask_amount, s.bid_count, s.ask_count)
                    .map(|level| (price, level))
                    .ok_or(OrderflowError::Overflow("deriving level totals"))
            })
            .collect::<Result<_>>()?;

        Ok(VolumeProfile::from_levels(levels))
    }
}

/// Convenience wrapper around [`VolumeProfileBuilder`].
///
/// # Errors
/// See [`VolumeProfileBuilder::new`] and [`VolumeProfileBuilder::build`].
pub fn build_volume_profile(trades: &[TradeRecord], scale: Decimal) -> Result<VolumeProfile> {
    VolumeProfileBuilder::new(scale)?.build(trades)
}
