use crate::models::{CandleRecord, TradeRecord};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use csv::{Reader, StringRecord, Writer};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::Path;
use std::str::FromStr;

pub struct CsvStorage;

impl CsvStorage {
    /// Reads trades from a CSV file.
    ///
    /// Format: timestamp,price,amount,side[,id]
    ///
    /// Rows are returned in file order, which is taken as arrival order.
    ///
    /// # Errors
    /// Returns error if the file cannot be opened or a row cannot be parsed
    pub fn read_trades(path: impl AsRef<Path>) -> Result<Vec<TradeRecord>> {
        let path = path.as_ref();
        let mut reader = Reader::from_path(path)
            .with_context(|| format!("Failed to open trades CSV: {}", path.display()))?;
        let mut trades = Vec::new();

        for (line, result) in reader.records().enumerate() {
            let record = result?;
            let row = line + 1;

            let mut trade = TradeRecord::new(
                parse_timestamp(column(&record, 0, row)?)?,
                Decimal::from_str(column(&record, 1, row)?)
                    .with_context(|| format!("row {row}: bad price"))?,
                Decimal::from_str(column(&record, 2, row)?)
                    .with_context(|| format!("row {row}: bad amount"))?,
                column(&record, 3, row)?,
            );
            if let Some(id) = record.get(4).filter(|id| !id.is_empty()) {
                trade = trade.with_id(id);
            }
            trades.push(trade);
        }

        tracing::debug!(count = trades.len(), path = %path.display(), "Loaded trades");
        Ok(trades)
    }

    /// Reads OHLCV candles from a CSV file.
    ///
    /// Format: timestamp,open,high,low,close,volume
    ///
    /// # Errors
    /// Returns error if the file cannot be opened or a row cannot be parsed
    pub fn read_candles(path: impl AsRef<Path>) -> Result<Vec<CandleRecord>> {
        let path = path.as_ref();
        let mut reader = Reader::from_path(path)
            .with_context(|| format!("Failed to open candles CSV: {}", path.display()))?;
        let mut candles = Vec::new();

        for (line, result) in reader.records().enumerate() {
            let record = result?;
            let row = line + 1;
            let decimal = |i: usize| -> Result<Decimal> {
                let raw = column(&record, i, row)?;
                Decimal::from_str(raw).with_context(|| format!("row {row}: bad decimal '{raw}'"))
            };

            candles.push(CandleRecord::new(
                parse_timestamp(column(&record, 0, row)?)?,
                decimal(1)?,
                decimal(2)?,
                decimal(3)?,
                decimal(4)?,
                decimal(5)?,
            ));
        }

        // Sort by timestamp to ensure chronological order
        candles.sort_by_key(|c| c.timestamp);
        Ok(candles)
    }

    /// Writes candles with their order-flow fields.
    ///
    /// Scalar fields are written as plain columns (empty when unset);
    /// structured fields are written as JSON.
    ///
    /// # Errors
    /// Returns error if file cannot be created or writing fails
    pub fn write_candles(path: impl AsRef<Path>, candles: &[CandleRecord]) -> Result<()> {
        let path = path.as_ref();
        let mut writer = Writer::from_path(path)
            .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

        writer.write_record([
            "timestamp",
            "open",
            "high",
            "low",
            "close",
            "volume",
            "bid",
            "ask",
            "delta",
            "min_delta",
            "max_delta",
            "total_trades",
            "stacked_imbalances_bid",
            "stacked_imbalances_ask",
            "orderflow",
            "imbalances",
            "trades",
        ])?;

        for candle in candles {
            let flow = &candle.orderflow;
            writer.write_record(&[
                candle.timestamp.to_rfc3339(),
                candle.open.to_string(),
                candle.high.to_string(),
                candle.low.to_string(),
                candle.close.to_string(),
                candle.volume.to_string(),
                optional(flow.bid),
                optional(flow.ask),
                optional(flow.delta),
                optional(flow.min_delta),
                optional(flow.max_delta),
                optional(flow.total_trades),
                optional(flow.stacked_imbalances_bid),
                optional(flow.stacked_imbalances_ask),
                optional_json(flow.orderflow.as_ref())?,
                optional_json(flow.imbalances.as_ref())?,
                optional_json(flow.trades.as_ref())?,
            ])?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// Parses RFC 3339 timestamps or integer epoch milliseconds.
///
/// # Errors
/// Returns error if the value is neither
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(millis) = raw.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis)
            .with_context(|| format!("timestamp out of range: {millis}"));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("invalid timestamp: '{raw}'"))
}

fn column(record: &StringRecord, index: usize, row: usize) -> Result<&str> {
    record
        .get(index)
        .with_context(|| format!("row {row}: missing column {index}"))
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn optional_json<T: Serialize>(value: Option<&T>) -> Result<String> {
    match value {
        Some(v) => Ok(serde_json::to_string(v)?),
        None => Ok(String::new()),
    }
}
