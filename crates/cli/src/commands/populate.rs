//! Populate command.
//!
//! Reads candles and trades from CSV, runs one aggregation pass and writes
//! the candles back out with their order-flow columns.

use anyhow::{Context, Result};
use clap::Args;
use footprint_core::{AppConfig, ConfigLoader};
use footprint_data::CsvStorage;
use footprint_orderflow::{populate_candles_with_trades, IntervalCache, PopulateSummary};
use std::path::Path;

/// Arguments for the populate command.
#[derive(Args, Debug, Clone)]
pub struct PopulateArgs {
    /// Config file path
    #[arg(short, long, default_value = "config/Config.toml", env = "FOOTPRINT_CONFIG")]
    pub config: String,

    /// Config profile layered over config/Config.toml (replaces --config)
    #[arg(long)]
    pub profile: Option<String>,

    /// Trades CSV (timestamp,price,amount,side[,id])
    #[arg(short, long)]
    pub trades: String,

    /// Candles CSV (timestamp,open,high,low,close,volume)
    #[arg(long)]
    pub candles: String,

    /// Output CSV path
    #[arg(short, long)]
    pub output: String,
}

/// Runs the populate command.
///
/// # Errors
/// Returns an error if configuration, input files or the aggregation pass fail.
pub fn run_populate(args: &PopulateArgs) -> Result<()> {
    let config = match &args.profile {
        Some(profile) => ConfigLoader::load_with_profile(profile)?,
        None => ConfigLoader::load_from(&args.config)?,
    };

    tracing::info!(
        "Populating {} with trades from {} ({} timeframe, {} mode)",
        args.candles,
        args.trades,
        config.timeframe,
        config.runmode.as_str()
    );

    let summary = populate_files(&config, &args.trades, &args.candles, &args.output)?;

    tracing::info!(
        groups = summary.groups,
        computed = summary.computed,
        cache_hits = summary.cache_hits,
        unmatched = summary.unmatched,
        possibly_unfinished = summary.possibly_unfinished,
        "Wrote candles to {}",
        args.output
    );

    Ok(())
}

fn populate_files(
    config: &AppConfig,
    trades_path: impl AsRef<Path>,
    candles_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> Result<PopulateSummary> {
    let trades = CsvStorage::read_trades(trades_path)?;
    let mut candles = CsvStorage::read_candles(candles_path)?;
    if candles.is_empty() {
        tracing::warn!("Candle file is empty, nothing to populate");
    }

    let mut cache = IntervalCache::new();
    let summary = populate_candles_with_trades(&mut cache, config, &mut candles, &trades)
        .context("Aggregation pass failed")?;

    CsvStorage::write_candles(output_path, &candles)?;
    Ok(summary)
}
