//! Populates candles with order-flow computed from their trades.
//!
//! Each call resets the order-flow fields of every candle, groups the trades
//! of the trailing `max_candles` window by candle, and fills each matching
//! candle either from the cache or by building its volume profile, imbalance
//! table and delta statistics.
//!
//! Updates are staged and committed only after every group has been
//! processed, so a failed call leaves both the candles and the cache as they
//! were.

use crate::cache::{IntervalCache, IntervalKey};
use crate::error::{OrderflowError, Result};
use crate::imbalance::ImbalanceDetector;
use crate::stacked::StackedImbalanceScanner;
use crate::volume_profile::VolumeProfileBuilder;
use anyhow::Context;
use chrono::{DateTime, Utc};
use footprint_core::{AppConfig, IntervalResolver, Timeframe};
use footprint_data::{CandleOrderflow, CandleRecord, TradeRecord};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::str::FromStr;
use std::time::Instant;

/// Counters describing one aggregation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulateSummary {
    /// Trade groups inside the window
    pub groups: usize,
    /// Candles computed from trades
    pub computed: usize,
    /// Candles served from the cache
    pub cache_hits: usize,
    /// Groups with no matching candle
    pub unmatched: usize,
    /// Groups whose successor candle had no trades yet
    pub possibly_unfinished: usize,
    /// Cache entries evicted
    pub evicted: usize,
}

struct StagedUpdate {
    index: usize,
    key: IntervalKey,
    orderflow: CandleOrderflow,
    from_cache: bool,
}

/// Key order of an [`IntervalCache`] as it evolves during staging.
///
/// Hits must see the inserts and evictions of earlier groups in the same pass.
/// Commit replays the same inserts and evictions on the real cache.
struct KeyShadow {
    live: HashSet<IntervalKey>,
    order: VecDeque<IntervalKey>,
}

impl KeyShadow {
    fn of(cache: &IntervalCache) -> Self {
        let order: VecDeque<IntervalKey> = cache.keys().copied().collect();
        Self {
            live: order.iter().copied().collect(),
            order,
        }
    }

    fn contains(&self, key: &IntervalKey) -> bool {
        self.live.contains(key)
    }

    fn insert(&mut self, key: IntervalKey) {
        if self.live.insert(key) {
            self.order.push_back(key);
        }
    }

    fn pop_oldest(&mut self) {
        if let Some(key) = self.order.pop_front() {
            self.live.remove(&key);
        }
    }

    fn len(&self) -> usize {
        self.live.len()
    }
}

/// Running min/max of cumulative per-trade delta plus side totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DeltaStats {
    bid: Decimal,
    ask: Decimal,
    delta: Decimal,
    min_delta: Decimal,
    max_delta: Decimal,
}

fn delta_stats(trades: &[TradeRecord]) -> anyhow::Result<Option<DeltaStats>> {
    let mut iter = trades.iter();
    let Some(first) = iter.next() else {
        return Ok(None);
    };

    let mut stats = DeltaStats {
        bid: first.bid_amount(),
        ask: first.ask_amount(),
        delta: Decimal::ZERO,
        min_delta: first.signed_volume(),
        max_delta: first.signed_volume(),
    };
    let mut cumulative = first.signed_volume();

    for trade in iter {
        cumulative = cumulative
            .checked_add(trade.signed_volume())
            .ok_or(OrderflowError::Overflow("accumulating trade delta"))?;
        stats.min_delta = stats.min_delta.min(cumulative);
        stats.max_delta = stats.max_delta.max(cumulative);
        stats.bid = stats
            .bid
            .checked_add(trade.bid_amount())
            .ok_or(OrderflowError::Overflow("summing bid volume"))?;
        stats.ask = stats
            .ask
            .checked_add(trade.ask_amount())
            .ok_or(OrderflowError::Overflow("summing ask volume"))?;
    }

    stats.delta = stats
        .ask
        .checked_sub(stats.bid)
        .ok_or(OrderflowError::Overflow("computing candle delta"))?;
    Ok(Some(stats))
}

/// Drives volume profile, imbalance and stacked imbalance computation per candle.
#[derive(Debug, Clone)]
pub struct OrderflowAggregator<R = Timeframe> {
    config: AppConfig,
    resolver: R,
}

impl OrderflowAggregator<Timeframe> {
    /// Creates an aggregator resolving boundaries from `config.timeframe`.
    ///
    /// # Errors
    /// Returns an error if the timeframe identifier is invalid.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let timeframe = Timeframe::from_str(&config.timeframe)?;
        Ok(Self::new(config.clone(), timeframe))
    }
}

impl<R: IntervalResolver> OrderflowAggregator<R> {
    pub fn new(config: AppConfig, resolver: R) -> Self {
        Self { config, resolver }
    }

    /// Populates `candles` with order-flow from `trades`, updating `cache`.
    ///
    /// `candles` are expected in ascending time order; `trades` in arrival
    /// order. Candles without trades end up with unset order-flow fields.
    ///
    /// # Errors
    /// Any failure while processing aborts the whole pass and is returned as
    /// [`OrderflowError::Dependency`]; candles and cache are left untouched.
    pub fn populate(
        &self,
        cache: &mut IntervalCache,
        candles: &mut [CandleRecord],
        trades: &[TradeRecord],
    ) -> Result<PopulateSummary> {
        if trades.is_empty() || candles.is_empty() {
            candles.iter_mut().for_each(CandleRecord::reset_orderflow);
            return Ok(PopulateSummary::default());
        }

        let started = Instant::now();
        let (staged, mut summary) = match self.stage(cache, candles, trades) {
            Ok(staged) => staged,
            Err(err) => {
                tracing::error!("Error populating candles with trades: {err:#}");
                return Err(OrderflowError::dependency(err));
            }
        };

        self.commit(staged, cache, candles, &mut summary);

        tracing::debug!(
            groups = summary.groups,
            computed = summary.computed,
            cache_hits = summary.cache_hits,
            elapsed_ms = started.elapsed().as_millis(),
            "Populated candles with trades"
        );
        Ok(summary)
    }

    fn stage(
        &self,
        cache: &IntervalCache,
        candles: &[CandleRecord],
        trades: &[TradeRecord],
    ) -> anyhow::Result<(Vec<StagedUpdate>, PopulateSummary)> {
        let orderflow = &self.config.orderflow;
        orderflow.validate()?;

        let builder = VolumeProfileBuilder::new(orderflow.scale)?;
        let detector = ImbalanceDetector::new(orderflow.imbalance_ratio, orderflow.imbalance_volume);
        let scanner = StackedImbalanceScanner::new(orderflow.stacked_imbalance_range);
        let bounded = self.config.runmode.is_live_like();
        let mut shadow = KeyShadow::of(cache);

        // earliest candle of the trailing window; older trades belong to
        // candles that were resolved on earlier passes
        let window_start = candles[candles.len().saturating_sub(orderflow.max_candles)].timestamp;

        let mut groups: BTreeMap<DateTime<Utc>, Vec<TradeRecord>> = BTreeMap::new();
        for trade in trades {
            let start = self
                .resolver
                .interval_start(trade.timestamp)
                .with_context(|| format!("resolving candle for trade at {}", trade.timestamp))?;
            if start >= window_start {
                groups.entry(start).or_default().push(trade.clone());
            }
        }

        let mut candle_index: HashMap<DateTime<Utc>, usize> = HashMap::with_capacity(candles.len());
        for (index, candle) in candles.iter().enumerate() {
            candle_index.entry(candle.timestamp).or_insert(index);
        }

        let mut summary = PopulateSummary {
            groups: groups.len(),
            ..PopulateSummary::default()
        };
        let mut staged = Vec::with_capacity(groups.len());

        for (start, group) in &groups {
            let Some(&index) = candle_index.get(start) else {
                tracing::debug!("Found no candle for trades starting at {start}");
                summary.unmatched += 1;
                continue;
            };

            let end = self
                .resolver
                .next_interval_start(*start)
                .with_context(|| format!("resolving candle after {start}"))?;
            if !groups.contains_key(&end) {
                tracing::warn!(
                    "candle at {start} with {} trades might be unfinished, because no finished trades at {end}",
                    group.len()
                );
                summary.possibly_unfinished += 1;
            }

            let key = IntervalKey::new(*start, end);
            let cached = if shadow.contains(&key) {
                cache.get(&key)
            } else {
                None
            };
            if let Some(cached) = cached {
                staged.push(StagedUpdate {
                    index,
                    key,
                    orderflow: cached.clone(),
                    from_cache: true,
                });
                continue;
            }

            let profile = builder
                .build(group)
                .with_context(|| format!("building volume profile for candle at {start}"))?;
            let imbalances = detector.detect(&profile);
            let stats = delta_stats(group)
                .with_context(|| format!("computing delta for candle at {start}"))?;

            staged.push(StagedUpdate {
                index,
                key,
                orderflow: CandleOrderflow {
                    trades: Some(group.clone()),
                    stacked_imbalances_bid: scanner.bid(&imbalances),
                    stacked_imbalances_ask: scanner.ask(&imbalances),
                    orderflow: Some(profile),
                    imbalances: Some(imbalances),
                    max_delta: stats.map(|s| s.max_delta),
                    min_delta: stats.map(|s| s.min_delta),
                    bid: stats.map(|s| s.bid),
                    ask: stats.map(|s| s.ask),
                    delta: stats.map(|s| s.delta),
                    total_trades: Some(group.len()),
                },
                from_cache: false,
            });

            shadow.insert(key);
            if bounded && shadow.len() > orderflow.cache_size {
                shadow.pop_oldest();
            }
        }

        Ok((staged, summary))
    }

    fn commit(
        &self,
        staged: Vec<StagedUpdate>,
        cache: &mut IntervalCache,
        candles: &mut [CandleRecord],
        summary: &mut PopulateSummary,
    ) {
        let orderflow = &self.config.orderflow;
        let bounded = self.config.runmode.is_live_like();

        candles.iter_mut().for_each(CandleRecord::reset_orderflow);

        for update in staged {
            if update.from_cache {
                summary.cache_hits += 1;
                candles[update.index].orderflow = update.orderflow;
                continue;
            }

            summary.computed += 1;
            cache.insert(update.key, update.orderflow.clone());
            candles[update.index].orderflow = update.orderflow;

            if bounded && cache.len() > orderflow.cache_size && cache.pop_oldest().is_some() {
                summary.evicted += 1;
            }
        }
    }
}

/// Populates candles using the boundaries of `config.timeframe`.
///
/// # Errors
/// Returns [`OrderflowError::Dependency`] on any failure, including an
/// invalid timeframe identifier.
pub fn populate_candles_with_trades(
    cache: &mut IntervalCache,
    config: &AppConfig,
    candles: &mut [CandleRecord],
    trades: &[TradeRecord],
) -> Result<PopulateSummary> {
    let aggregator = OrderflowAggregator::from_config(config).map_err(|err| {
        tracing::error!("Error populating candles with trades: {err}");
        OrderflowError::dependency(err)
    })?;
    aggregator.populate(cache, candles, trades)
}
