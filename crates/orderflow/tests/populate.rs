//! End-to-end tests for the order-flow aggregation pass.

use chrono::{DateTime, Duration, TimeZone, Utc};
use footprint_core::{AppConfig, RunMode};
use footprint_data::{CandleRecord, LevelImbalance, TradeRecord};
use footprint_orderflow::{
    populate_candles_with_trades, IntervalCache, IntervalKey, OrderflowAggregator,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn at(minute: i64, second: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 29, 10, 0, 0).unwrap()
        + Duration::minutes(minute)
        + Duration::seconds(second)
}

fn candles(count: i64) -> Vec<CandleRecord> {
    (0..count)
        .map(|m| CandleRecord::new(at(m, 0), dec!(100), dec!(101), dec!(99), dec!(100), dec!(0)))
        .collect()
}

fn trade(minute: i64, second: i64, price: Decimal, side: &str, amount: Decimal) -> TradeRecord {
    TradeRecord::new(at(minute, second), price, amount, side)
}

fn config(runmode: RunMode) -> AppConfig {
    let mut config = AppConfig::default();
    config.runmode = runmode;
    config.orderflow.scale = dec!(0.5);
    config
}

/// Trades for the 10:00 candle plus one trade in 10:01 so 10:00 is finished.
fn scenario_trades() -> Vec<TradeRecord> {
    vec![
        trade(0, 1, dec!(100.0), "buy", dec!(2)),
        trade(0, 2, dec!(100.0), "sell", dec!(1)),
        trade(0, 3, dec!(100.5), "buy", dec!(5)),
        trade(1, 1, dec!(101.0), "sell", dec!(1)),
    ]
}

#[test]
fn test_profile_and_totals_for_reference_candle() {
    let mut candles = candles(2);
    let mut cache = IntervalCache::new();

    let summary = populate_candles_with_trades(
        &mut cache,
        &config(RunMode::Backtest),
        &mut candles,
        &scenario_trades(),
    )
    .unwrap();
    assert_eq!(summary.computed, 2);

    let flow = &candles[0].orderflow;
    let profile = flow.orderflow.as_ref().unwrap();
    assert_eq!(profile.len(), 2);

    let low = profile.get(dec!(100.0)).unwrap();
    assert_eq!(low.bid_amount, dec!(1));
    assert_eq!(low.ask_amount, dec!(2));
    assert_eq!(low.delta, dec!(1));
    assert_eq!(low.total_volume, dec!(3));
    assert_eq!(low.total_trades, 2);

    let high = profile.get(dec!(100.5)).unwrap();
    assert_eq!(high.bid_amount, dec!(0));
    assert_eq!(high.ask_amount, dec!(5));
    assert_eq!(high.delta, dec!(5));
    assert_eq!(high.total_volume, dec!(5));
    assert_eq!(high.total_trades, 1);

    assert_eq!(flow.bid, Some(dec!(1)));
    assert_eq!(flow.ask, Some(dec!(7)));
    assert_eq!(flow.delta, Some(dec!(6)));
    assert_eq!(flow.total_trades, Some(3));
    // cumulative per-trade delta: 2, 1, 6
    assert_eq!(flow.min_delta, Some(dec!(1)));
    assert_eq!(flow.max_delta, Some(dec!(6)));
    assert_eq!(flow.trades.as_ref().map(Vec::len), Some(3));

    // ask at 100.5 (5) over bid at 100 (1) exceeds the default ratio of 3
    let imbalances = flow.imbalances.as_ref().unwrap();
    assert_eq!(
        imbalances.get(dec!(100.0)),
        Some(&LevelImbalance {
            bid_imbalance: false,
            ask_imbalance: true
        })
    );
    assert_eq!(imbalances.get(dec!(100.5)), Some(&LevelImbalance::default()));
    // a single imbalanced level is not a stack of three
    assert_eq!(flow.stacked_imbalances_ask, None);
    assert_eq!(flow.stacked_imbalances_bid, None);
}

#[test]
fn test_candle_without_trades_stays_unset() {
    let mut candles = candles(3);
    let mut cache = IntervalCache::new();

    populate_candles_with_trades(
        &mut cache,
        &config(RunMode::Backtest),
        &mut candles,
        &scenario_trades(),
    )
    .unwrap();

    let empty = &candles[2].orderflow;
    assert!(empty.is_unset());
    assert_eq!(empty.delta, None);
    assert_eq!(empty.total_trades, None);
}

#[test]
fn test_group_without_candle_is_dropped() {
    // trades at 10:05 have no candle in the table
    let mut candles = candles(2);
    let mut trades = scenario_trades();
    trades.push(trade(5, 0, dec!(100), "buy", dec!(9)));
    let mut cache = IntervalCache::new();

    let summary = populate_candles_with_trades(
        &mut cache,
        &config(RunMode::Backtest),
        &mut candles,
        &trades,
    )
    .unwrap();

    assert_eq!(summary.unmatched, 1);
    assert_eq!(candles.len(), 2);
    assert_eq!(cache.len(), 2);
    assert!(cache.keys().all(|key| key.start != at(5, 0)));
}

#[test]
fn test_second_pass_is_served_from_cache() {
    let config = config(RunMode::DryRun);
    let aggregator = OrderflowAggregator::from_config(&config).unwrap();
    let trades = scenario_trades();
    let mut cache = IntervalCache::new();

    let mut first = candles(2);
    aggregator.populate(&mut cache, &mut first, &trades).unwrap();

    let mut second = candles(2);
    let summary = aggregator.populate(&mut cache, &mut second, &trades).unwrap();

    assert_eq!(summary.cache_hits, 2);
    assert_eq!(summary.computed, 0);
    assert_eq!(first, second);
}

#[test]
fn test_cache_hit_skips_recomputation() {
    let config = config(RunMode::Live);
    let aggregator = OrderflowAggregator::from_config(&config).unwrap();
    let trades = scenario_trades();
    let mut cache = IntervalCache::new();
    let mut table = candles(2);
    aggregator.populate(&mut cache, &mut table, &trades).unwrap();

    // overwrite the cached entry; a recomputation would restore the real delta
    let key = IntervalKey::new(at(0, 0), at(1, 0));
    let mut marked = cache.get(&key).unwrap().clone();
    marked.delta = Some(dec!(-999));
    cache.insert(key, marked);

    let mut table = candles(2);
    aggregator.populate(&mut cache, &mut table, &trades).unwrap();
    assert_eq!(table[0].orderflow.delta, Some(dec!(-999)));
}

#[test]
fn test_live_cache_is_bounded_across_passes() {
    let mut config = config(RunMode::Live);
    config.orderflow.cache_size = 3;
    let aggregator = OrderflowAggregator::from_config(&config).unwrap();
    let mut cache = IntervalCache::new();

    // one trade per minute, the table slides forward one candle per pass
    for pass in 0..5 {
        let mut table: Vec<CandleRecord> = (pass..pass + 3)
            .map(|m| CandleRecord::new(at(m, 0), dec!(1), dec!(1), dec!(1), dec!(1), dec!(1)))
            .collect();
        let trades: Vec<TradeRecord> = (pass..pass + 3)
            .map(|m| trade(m, 10, dec!(100), "buy", dec!(1)))
            .collect();
        aggregator.populate(&mut cache, &mut table, &trades).unwrap();
        assert!(cache.len() <= 3);
    }

    let starts: Vec<DateTime<Utc>> = cache.keys().map(|k| k.start).collect();
    assert_eq!(starts, vec![at(4, 0), at(5, 0), at(6, 0)]);
}

#[test]
fn test_stacked_imbalances_reported_at_ladder_ends() {
    // bids dominate diagonally on 100.0..101.0, asks on 102.0..103.0
    let trades = vec![
        trade(0, 1, dec!(100.0), "sell", dec!(10)),
        trade(0, 2, dec!(100.5), "sell", dec!(10)),
        trade(0, 3, dec!(101.0), "sell", dec!(10)),
        trade(0, 4, dec!(101.5), "buy", dec!(1)),
        trade(0, 5, dec!(102.0), "sell", dec!(1)),
        trade(0, 6, dec!(102.5), "sell", dec!(1)),
        trade(0, 7, dec!(103.0), "sell", dec!(1)),
        trade(0, 8, dec!(103.5), "buy", dec!(10)),
        trade(0, 9, dec!(100.5), "buy", dec!(1)),
        trade(0, 10, dec!(101.0), "buy", dec!(1)),
        trade(0, 11, dec!(102.5), "buy", dec!(10)),
        trade(0, 12, dec!(103.0), "buy", dec!(10)),
        trade(1, 0, dec!(100.0), "buy", dec!(1)),
    ];
    let mut table = candles(2);
    let mut cache = IntervalCache::new();
    populate_candles_with_trades(&mut cache, &config(RunMode::Backtest), &mut table, &trades)
        .unwrap();

    let flow = &table[0].orderflow;
    // bid flags true at 100.0, 100.5, 101.0: first level completing a run of 3
    assert_eq!(flow.stacked_imbalances_bid, Some(dec!(101.0)));
    // ask flags true at 102.0, 102.5, 103.0: highest qualifying level
    assert_eq!(flow.stacked_imbalances_ask, Some(dec!(103.0)));
}
