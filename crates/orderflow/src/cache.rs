//! Insertion-ordered cache of finalized candle order-flow.
//!
//! Entries are evicted oldest-inserted first. Reads never change the eviction
//! order, and overwriting an existing key keeps its original position.

use chrono::{DateTime, Utc};
use footprint_data::CandleOrderflow;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Candle boundaries `[start, end)` identifying a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntervalKey {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl IntervalKey {
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

/// FIFO cache of per-candle results.
///
/// Capacity is not enforced here; callers decide when to call
/// [`IntervalCache::pop_oldest`].
#[derive(Debug, Clone, Default)]
pub struct IntervalCache {
    entries: HashMap<IntervalKey, CandleOrderflow>,
    order: VecDeque<IntervalKey>,
}

impl IntervalCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &IntervalKey) -> Option<&CandleOrderflow> {
        self.entries.get(key)
    }

    /// Inserts or replaces an entry. Returns the previous value, if any.
    pub fn insert(&mut self, key: IntervalKey, value: CandleOrderflow) -> Option<CandleOrderflow> {
        let previous = self.entries.insert(key, value);
        if previous.is_none() {
            self.order.push_back(key);
        }
        previous
    }

    /// Removes and returns the oldest-inserted entry.
    pub fn pop_oldest(&mut self) -> Option<(IntervalKey, CandleOrderflow)> {
        while let Some(key) = self.order.pop_front() {
            if let Some(value) = self.entries.remove(&key) {
                return Some((key, value));
            }
        }
        None
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &IntervalKey> {
        self.order.iter()
    }
}
