//! Diagonal bid/ask imbalance detection.
//!
//! Resting bids at level `i` absorb sells while the aggressive buys that
//! matter for them trade one level up, so level `i` bid volume is compared
//! with level `i + 1` ask volume, and the other way round for asks.
//!
//! Ratio policy for a zero denominator: a positive numerator over zero is an
//! unbounded ratio and counts as an imbalance; zero over zero is undefined and
//! does not.

use footprint_data::{ImbalanceTable, LevelImbalance, PriceLevel, VolumeProfile};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Returns true if `numerator / denominator` exceeds `ratio`.
#[must_use]
pub fn exceeds_ratio(numerator: Decimal, denominator: Decimal, ratio: Decimal) -> bool {
    if denominator.is_zero() {
        return numerator > Decimal::ZERO;
    }
    match numerator.checked_div(denominator) {
        Some(quotient) => quotient > ratio,
        // only reachable for huge numerators over tiny denominators
        None => numerator.is_sign_positive() == denominator.is_sign_positive(),
    }
}

/// Flags imbalanced levels of a volume profile.
#[derive(Debug, Clone, Copy)]
pub struct ImbalanceDetector {
    /// Diagonal ratio that must be exceeded
    pub imbalance_ratio: Decimal,
    /// Minimum level volume for a level to be eligible
    pub imbalance_volume: Decimal,
}

impl ImbalanceDetector {
    #[must_use]
    pub fn new(imbalance_ratio: Decimal, imbalance_volume: Decimal) -> Self {
        Self {
            imbalance_ratio,
            imbalance_volume,
        }
    }

    /// Computes imbalance flags aligned with `profile`'s bins.
    ///
    /// The top bin has no diagonal neighbour and is never imbalanced.
    #[must_use]
    pub fn detect(&self, profile: &VolumeProfile) -> ImbalanceTable {
        let levels: Vec<(Decimal, &PriceLevel)> = profile.iter().collect();
        let mut table = BTreeMap::new();

        for (i, (price, level)) in levels.iter().enumerate() {
            let flags = match levels.get(i + 1) {
                Some((_, above)) if level.total_volume >= self.imbalance_volume => {
                    LevelImbalance {
                        bid_imbalance: exceeds_ratio(
                            level.bid_amount,
                            above.ask_amount,
                            self.imbalance_ratio,
                        ),
                        ask_imbalance: exceeds_ratio(
                            above.ask_amount,
                            level.bid_amount,
                            self.imbalance_ratio,
                        ),
                    }
                }
                _ => LevelImbalance::default(),
            };
            table.insert(*price, flags);
        }

        ImbalanceTable::from_levels(table)
    }
}
