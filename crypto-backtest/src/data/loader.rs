use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use common::{BacktestError, Bar, Result, Timestamp};
use serde_json::Value;

use super::kline::parse_kline_rows;

/// Integers below this magnitude are epoch seconds, not milliseconds
const SECONDS_CUTOFF: i64 = 100_000_000_000;

/// Load bars from CSV file
///
/// Columns: timestamp, open, high, low, close, volume, [quote_volume], [trades_count]
pub fn load_csv(path: &Path) -> Result<Vec<Bar>> {
    let file = File::open(path)
        .map_err(|e| BacktestError::DataLoad(format!("{}: {}", path.display(), e)))?;
    read_csv(BufReader::new(file))
}

pub fn read_csv<R: std::io::Read>(reader: R) -> Result<Vec<Bar>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut bars = Vec::new();

    for (line, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| BacktestError::Csv(e.to_string()))?;

        if record.len() < 6 {
            return Err(BacktestError::Csv(format!(
                "record {}: expected at least 6 columns, got {}",
                line + 1,
                record.len()
            )));
        }

        let field = |idx: usize, name: &str| -> Result<f64> {
            record[idx].parse().map_err(|_| {
                BacktestError::Csv(format!(
                    "record {}: invalid {} {:?}",
                    line + 1,
                    name,
                    &record[idx]
                ))
            })
        };

        let mut bar = Bar::new(
            parse_timestamp(&record[0])?,
            field(1, "open")?,
            field(2, "high")?,
            field(3, "low")?,
            field(4, "close")?,
            field(5, "volume")?,
        );
        if let Some(quote_volume) = record.get(6).and_then(|s| s.parse().ok()) {
            bar.quote_volume = quote_volume;
        }
        if let Some(trades_count) = record.get(7).and_then(|s| s.parse().ok()) {
            bar.trades_count = trades_count;
        }
        bars.push(bar);
    }

    Ok(bars)
}

/// Load bars from JSON file: an array of bar records or of exchange kline tuples
pub fn load_json(path: &Path) -> Result<Vec<Bar>> {
    let file = File::open(path)
        .map_err(|e| BacktestError::DataLoad(format!("{}: {}", path.display(), e)))?;
    let value: Value = serde_json::from_reader(BufReader::new(file))?;
    parse_json(value)
}

pub fn parse_json(value: Value) -> Result<Vec<Bar>> {
    let rows = value
        .as_array()
        .ok_or_else(|| BacktestError::DataLoad("expected a JSON array of bars".to_string()))?;

    match rows.first() {
        Some(Value::Array(_)) => parse_kline_rows(rows),
        Some(_) => Ok(serde_json::from_value(value)?),
        None => Ok(Vec::new()),
    }
}

/// Parse timestamp from various formats into epoch milliseconds
pub fn parse_timestamp(s: &str) -> Result<Timestamp> {
    let s = s.trim();

    if let Ok(ts) = s.parse::<i64>() {
        return Ok(if ts.abs() < SECONDS_CUTOFF { ts * 1000 } else { ts });
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.timestamp_millis());
    }

    let formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y/%m/%d %H:%M:%S",
    ];
    for fmt in &formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Some(dt) = NaiveDate::parse_from_str(s, fmt)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }

    Err(BacktestError::Csv(format!(
        "Unable to parse timestamp: {}",
        s
    )))
}
