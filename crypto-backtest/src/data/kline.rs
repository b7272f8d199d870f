use common::{BacktestError, Bar, Result};
use serde_json::Value;

/// Minimum columns in an exchange kline row (open time through trade count)
const KLINE_COLUMNS: usize = 9;

/// Convert exchange kline tuples into bars
///
/// Row layout: `[open_time, open, high, low, close, volume, close_time,
/// quote_volume, trades_count, ...]`, with prices and volumes sent as
/// decimal strings.
pub fn parse_kline_rows(rows: &[Value]) -> Result<Vec<Bar>> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            parse_kline_row(row)
                .map_err(|e| BacktestError::Collector(format!("kline row {}: {}", i, e)))
        })
        .collect()
}

pub fn parse_kline_row(row: &Value) -> std::result::Result<Bar, String> {
    let fields = row.as_array().ok_or("expected an array")?;
    if fields.len() < KLINE_COLUMNS {
        return Err(format!(
            "expected at least {} fields, got {}",
            KLINE_COLUMNS,
            fields.len()
        ));
    }

    let timestamp = fields[0]
        .as_i64()
        .ok_or("open time is not an integer")?;
    let mut bar = Bar::new(
        timestamp,
        number(&fields[1], "open")?,
        number(&fields[2], "high")?,
        number(&fields[3], "low")?,
        number(&fields[4], "close")?,
        number(&fields[5], "volume")?,
    );
    bar.quote_volume = number(&fields[7], "quote volume")?;
    bar.trades_count = fields[8].as_u64().ok_or("trade count is not an integer")?;
    Ok(bar)
}

/// Exchanges send decimals as strings; plain JSON numbers are accepted too
fn number(value: &Value, field: &str) -> std::result::Result<f64, String> {
    match value {
        Value::String(s) => s
            .parse()
            .map_err(|_| format!("{} is not a number: {:?}", field, s)),
        Value::Number(n) => n.as_f64().ok_or_else(|| format!("{} out of range", field)),
        _ => Err(format!("{} has unexpected type", field)),
    }
}
