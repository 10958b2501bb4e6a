//! Stacked imbalance scanning.
//!
//! A stacked imbalance is a run of consecutive imbalanced price levels. Bid
//! stacks are reported at the lowest qualifying level, ask stacks at the
//! highest one.

use footprint_data::ImbalanceTable;
use rust_decimal::Decimal;

/// Which end of the price ladder the scan reports from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDirection {
    /// Report the first qualifying level scanning low to high
    Ascending,
    /// Report the first qualifying level scanning high to low
    Descending,
}

/// Length of the run of `true` values ending at each position.
#[must_use]
pub fn run_lengths(flags: &[bool]) -> Vec<usize> {
    flags
        .iter()
        .scan(0usize, |run, &flag| {
            *run = if flag { *run + 1 } else { 0 };
            Some(*run)
        })
        .collect()
}

/// Finds the price where a run of at least `range` consecutive flags qualifies.
///
/// `levels` must be in ascending price order. A position qualifies once the
/// run ending at it is at least `range` long, so in ascending order the
/// reported price is the top of the first complete run, and in descending
/// order it is the highest qualifying position overall. With a `range` of 0
/// every position qualifies, flagged or not.
#[must_use]
pub fn stacked_imbalance(
    levels: &[(Decimal, bool)],
    range: usize,
    direction: ScanDirection,
) -> Option<Decimal> {
    let flags: Vec<bool> = levels.iter().map(|(_, flag)| *flag).collect();
    let runs = run_lengths(&flags);
    let mut qualifying = levels
        .iter()
        .zip(runs)
        .filter(|(_, run)| *run >= range)
        .map(|((price, _), _)| *price);

    match direction {
        ScanDirection::Ascending => qualifying.next(),
        ScanDirection::Descending => qualifying.last(),
    }
}

/// Scans for stacked imbalances in an [`ImbalanceTable`].
#[derive(Debug, Clone, Copy)]
pub struct StackedImbalanceScanner {
    range: usize,
}

impl StackedImbalanceScanner {
    #[must_use]
    pub fn new(range: usize) -> Self {
        Self { range }
    }

    /// Lowest qualifying price of a stacked bid imbalance.
    #[must_use]
    pub fn bid(&self, table: &ImbalanceTable) -> Option<Decimal> {
        stacked_imbalance(&table.bid_flags(), self.range, ScanDirection::Ascending)
    }

    /// Highest qualifying price of a stacked ask imbalance.
    #[must_use]
    pub fn ask(&self, table: &ImbalanceTable) -> Option<Decimal> {
        stacked_imbalance(&table.ask_flags(), self.range, ScanDirection::Descending)
    }
}
