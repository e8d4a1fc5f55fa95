//! Bar series loaded from CSV files named `{symbol}_{timeframe}.csv`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use trading_core::error::DataError;
use trading_core::{Bar, BarSeries, Timeframe};

/// CSV record format.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Date", alias = "date", alias = "Timestamp", alias = "time", alias = "open_time")]
    timestamp: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume", default)]
    volume: f64,
}

pub fn bar_file(dir: &Path, symbol: &str, timeframe: Timeframe) -> PathBuf {
    dir.join(format!("{}_{}.csv", symbol, timeframe.label()))
}

/// The most recent `capacity` bars of one symbol and timeframe.
pub fn load_series(dir: &Path, symbol: &str, timeframe: Timeframe, capacity: usize) -> Result<BarSeries, DataError> {
    let path = bar_file(dir, symbol, timeframe);
    if !path.exists() {
        return Err(DataError::NoDataAvailable {
            symbol: symbol.to_string(),
            timeframe,
        });
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(&path)
        .map_err(|e| DataError::ParseError(format!("{}: {}", path.display(), e)))?;

    let mut bars = Vec::new();
    for result in reader.deserialize() {
        let record: CsvRecord = result.map_err(|e| DataError::ParseError(format!("{}: {}", path.display(), e)))?;
        bars.push(Bar::new(
            parse_timestamp(&record.timestamp)?,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        ));
    }
    if bars.is_empty() {
        return Err(DataError::NoDataAvailable {
            symbol: symbol.to_string(),
            timeframe,
        });
    }

    // Exchange exports are not always sorted
    bars.sort_by_key(|b| b.timestamp);

    let mut series = BarSeries::with_capacity(symbol, timeframe, capacity);
    series.extend(bars)?;
    Ok(series)
}

/// Unix seconds or milliseconds, RFC 3339, or a few common date formats.
fn parse_timestamp(raw: &str) -> Result<i64, DataError> {
    if let Ok(ts) = raw.parse::<i64>() {
        // Milliseconds once past 10 digits
        return Ok(if ts > 10_000_000_000 { ts } else { ts * 1000 });
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.timestamp_millis());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }
    Err(DataError::ParseError(format!("Could not parse timestamp: {}", raw)))
}
