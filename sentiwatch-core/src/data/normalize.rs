//! Series Normalizer: raw nested price payload to an ascending bar series.
//!
//! The payload maps a series-kind-specific key to an object of
//! `timestamp → { "1. open": "...", "2. high": "...", ... }`. Inner columns
//! map positionally onto open/high/low/close/volume. A column's position is
//! its numeric key prefix (`"4. close"`), or its OHLCV name when the key is
//! unnumbered; `serde_json` object iteration order is never relied on.
//!
//! Timestamps are unique within one series: two keys that parse to the same
//! instant are a `MalformedRecord`.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

use super::provider::DataError;
use crate::domain::{PriceBar, SeriesKind};

/// Keys the provider uses to explain an empty response.
const PROVIDER_NOTE_KEYS: [&str; 3] = ["Error Message", "Note", "Information"];

/// Open, high, low and close are required; volume is optional.
const REQUIRED_COLUMNS: usize = 4;

/// Column names accepted on unnumbered keys, in positional order.
const COLUMN_NAMES: [&str; 5] = ["open", "high", "low", "close", "volume"];

/// Normalize a raw price payload into bars strictly ascending by timestamp.
///
/// Returns `DataError::NoData` when the series key for `kind` is absent.
pub fn normalize(payload: &Value, kind: SeriesKind) -> Result<Vec<PriceBar>, DataError> {
    let series_key = kind.series_key();

    let records = match payload.get(&series_key) {
        Some(records) => records,
        None => {
            return Err(DataError::NoData {
                detail: provider_note(payload),
                series_key,
            })
        }
    };

    let records = records.as_object().ok_or_else(|| {
        DataError::ResponseFormatChanged(format!("'{series_key}' is not an object"))
    })?;

    let mut rows = records
        .iter()
        .map(|(stamp, record)| parse_bar(stamp, record).map(|bar| (stamp.as_str(), bar)))
        .collect::<Result<Vec<_>, _>>()?;

    rows.sort_by_key(|(_, bar)| bar.timestamp);
    if let Some(pair) = rows
        .windows(2)
        .find(|pair| pair[0].1.timestamp == pair[1].1.timestamp)
    {
        return Err(DataError::MalformedRecord {
            key: pair[1].0.to_string(),
            reason: format!(
                "duplicate timestamp {} (also '{}')",
                pair[1].1.timestamp, pair[0].0
            ),
        });
    }

    Ok(rows.into_iter().map(|(_, bar)| bar).collect())
}

/// Provider explanation for a payload without data, if it carries one.
pub fn provider_note(payload: &Value) -> Option<String> {
    PROVIDER_NOTE_KEYS
        .iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Parse a provider timestamp: `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD HH:MM`,
/// or a bare date (midnight).
pub fn parse_timestamp(stamp: &str) -> Option<NaiveDateTime> {
    let stamp = stamp.trim();
    NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(stamp, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_bar(stamp: &str, record: &Value) -> Result<PriceBar, DataError> {
    let malformed = |reason: String| DataError::MalformedRecord {
        key: stamp.to_string(),
        reason,
    };

    let timestamp =
        parse_timestamp(stamp).ok_or_else(|| malformed("unparseable timestamp".into()))?;

    let columns = record
        .as_object()
        .ok_or_else(|| malformed("record is not an object".into()))
        .and_then(|fields| numeric_columns(fields).map_err(malformed))?;

    if columns.len() < REQUIRED_COLUMNS {
        return Err(malformed(format!(
            "expected at least {REQUIRED_COLUMNS} numeric columns, found {}",
            columns.len()
        )));
    }

    Ok(PriceBar {
        timestamp,
        open: columns[0],
        high: columns[1],
        low: columns[2],
        close: columns[3],
        volume: columns.get(4).copied(),
    })
}

/// Position of a column key: its numeric prefix, else its OHLCV name.
fn column_position(name: &str) -> Option<usize> {
    let name = name.trim();
    if let Some((prefix, _)) = name.split_once('.') {
        if let Ok(position) = prefix.trim().parse::<usize>() {
            return Some(position);
        }
    }
    COLUMN_NAMES
        .iter()
        .position(|known| name.eq_ignore_ascii_case(known))
        .map(|index| index + 1)
}

/// Numeric column values in positional order. Values may be JSON numbers or
/// numeric strings.
fn numeric_columns(fields: &Map<String, Value>) -> Result<Vec<f64>, String> {
    let mut columns = fields
        .iter()
        .map(|(name, value)| {
            let position =
                column_position(name).ok_or_else(|| format!("unrecognized column '{name}'"))?;
            let parsed = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            parsed
                .map(|v| (position, v))
                .ok_or_else(|| format!("column '{name}' is not numeric: {value}"))
        })
        .collect::<Result<Vec<_>, String>>()?;

    columns.sort_by_key(|(position, _)| *position);
    if let Some(pair) = columns.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        return Err(format!("two columns share position {}", pair[0].0));
    }
    Ok(columns.into_iter().map(|(_, v)| v).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IntradayInterval;
    use serde_json::json;

    fn daily_payload() -> Value {
        json!({
            "Meta Data": { "2. Symbol": "IBM" },
            "Time Series (Daily)": {
                "2024-01-04": {
                    "1. open": "161.0", "2. high": "163.0", "3. low": "160.5",
                    "4. close": "162.0", "5. volume": "4000000"
                },
                "2024-01-02": {
                    "1. open": "160.0", "2. high": "162.0", "3. low": "159.0",
                    "4. close": "161.5", "5. volume": "3500000"
                },
                "2024-01-03": {
                    "1. open": "161.5", "2. high": "161.9", "3. low": "158.0",
                    "4. close": "158.5", "5. volume": "5000000"
                }
            }
        })
    }

    #[test]
    fn normalizes_and_sorts_ascending() {
        let bars = normalize(&daily_payload(), SeriesKind::Daily).unwrap();
        assert_eq!(bars.len(), 3);
        for pair in bars.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
        }
        assert_eq!(bars[0].close, 161.5);
        assert_eq!(bars[1].low, 158.0);
        assert_eq!(bars[2].volume, Some(4_000_000.0));
    }

    #[test]
    fn missing_series_key_is_no_data() {
        let payload = json!({ "Note": "Thank you for using Alpha Vantage! Our standard API rate limit is 25 requests per day." });
        match normalize(&payload, SeriesKind::Weekly) {
            Err(DataError::NoData { series_key, detail }) => {
                assert_eq!(series_key, "Weekly Time Series");
                assert!(detail.unwrap().starts_with("Thank you"));
            }
            other => panic!("expected NoData, got {other:?}"),
        }
    }

    #[test]
    fn wrong_kind_is_no_data() {
        let err = normalize(&daily_payload(), SeriesKind::Monthly).unwrap_err();
        assert!(err.is_no_data());
    }

    #[test]
    fn four_columns_leave_volume_absent() {
        let payload = json!({
            "Monthly Time Series": {
                "2024-02-29": { "1. open": "1", "2. high": "2", "3. low": "0.5", "4. close": "1.5" }
            }
        });
        let bars = normalize(&payload, SeriesKind::Monthly).unwrap();
        assert_eq!(bars[0].close, 1.5);
        assert_eq!(bars[0].volume, None);
    }

    #[test]
    fn fewer_than_four_columns_is_malformed() {
        let payload = json!({
            "Monthly Time Series": {
                "2024-02-29": { "1. open": "1", "2. high": "2", "3. low": "0.5" }
            }
        });
        let err = normalize(&payload, SeriesKind::Monthly).unwrap_err();
        assert!(matches!(err, DataError::MalformedRecord { .. }));
    }

    #[test]
    fn non_numeric_value_is_malformed() {
        let payload = json!({
            "Time Series (Daily)": {
                "2024-01-02": { "1. open": "n/a", "2. high": "2", "3. low": "1", "4. close": "1.5" }
            }
        });
        let err = normalize(&payload, SeriesKind::Daily).unwrap_err();
        assert!(err.to_string().contains("1. open"));
    }

    #[test]
    fn intraday_key_follows_interval() {
        let payload = json!({
            "Time Series (1min)": {
                "2024-01-02 09:31:00": { "1. open": "1", "2. high": "2", "3. low": "0.5", "4. close": "1.5", "5. volume": "10" },
                "2024-01-02 09:30:00": { "1. open": "1", "2. high": "2", "3. low": "0.5", "4. close": "1.0", "5. volume": "10" }
            }
        });
        let kind = SeriesKind::Intraday(IntradayInterval::OneMinute);
        let bars = normalize(&payload, kind).unwrap();
        assert_eq!(bars[0].close, 1.0);
        assert_eq!(
            bars[1].timestamp,
            NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(9, 31, 0)
                .unwrap()
        );
        let other = SeriesKind::Intraday(IntradayInterval::FiveMinutes);
        assert!(normalize(&payload, other).unwrap_err().is_no_data());
    }

    #[test]
    fn timestamp_formats() {
        assert!(parse_timestamp("2024-01-02").is_some());
        assert!(parse_timestamp("2024-01-02 16:00:00").is_some());
        assert!(parse_timestamp("2024-01-02 16:00").is_some());
        assert!(parse_timestamp("Jan 2 2024").is_none());
    }

    #[test]
    fn unnumbered_columns_map_by_name() {
        let payload = json!({
            "Time Series (Daily)": {
                "2024-01-02": {
                    "open": "157.5", "high": "159.0", "low": "156.8",
                    "close": "158.0", "volume": "3000000"
                }
            }
        });
        let bars = normalize(&payload, SeriesKind::Daily).unwrap();
        assert_eq!(bars[0].open, 157.5);
        assert_eq!(bars[0].high, 159.0);
        assert_eq!(bars[0].low, 156.8);
        assert_eq!(bars[0].close, 158.0);
        assert_eq!(bars[0].volume, Some(3_000_000.0));
    }

    #[test]
    fn numbered_columns_map_by_prefix_not_name() {
        let payload = json!({
            "Time Series (Daily)": {
                "2024-01-02": {
                    "4. last": "158.0", "1. first": "157.5", "3. bottom": "156.8", "2. top": "159.0"
                }
            }
        });
        let bars = normalize(&payload, SeriesKind::Daily).unwrap();
        assert_eq!(bars[0].open, 157.5);
        assert_eq!(bars[0].high, 159.0);
        assert_eq!(bars[0].low, 156.8);
        assert_eq!(bars[0].close, 158.0);
    }

    #[test]
    fn unrecognized_column_is_malformed() {
        let payload = json!({
            "Time Series (Daily)": {
                "2024-01-02": { "open": "1", "high": "2", "low": "0.5", "close": "1.5", "vwap": "1.2" }
            }
        });
        let err = normalize(&payload, SeriesKind::Daily).unwrap_err();
        assert!(err.to_string().contains("vwap"));
    }

    #[test]
    fn duplicate_timestamp_is_malformed() {
        let payload = json!({
            "Time Series (Daily)": {
                "2024-01-02": { "1. open": "1", "2. high": "2", "3. low": "0.5", "4. close": "1.5" },
                "2024-01-02 00:00:00": { "1. open": "1", "2. high": "2", "3. low": "0.5", "4. close": "1.7" },
                "2024-01-03": { "1. open": "1", "2. high": "2", "3. low": "0.5", "4. close": "1.6" }
            }
        });
        match normalize(&payload, SeriesKind::Daily) {
            Err(DataError::MalformedRecord { key, reason }) => {
                assert!(key.starts_with("2024-01-02"));
                assert!(reason.contains("duplicate timestamp"));
            }
            other => panic!("expected MalformedRecord, got {other:?}"),
        }
    }

    #[test]
    fn numeric_json_values_are_accepted() {
        let payload = json!({
            "Time Series (Daily)": {
                "2024-01-02": { "1. open": 1.0, "2. high": 2, "3. low": 0.5, "4. close": 1.25, "5. volume": 100 }
            }
        });
        let bars = normalize(&payload, SeriesKind::Daily).unwrap();
        assert_eq!(bars[0].high, 2.0);
        assert_eq!(bars[0].volume, Some(100.0));
    }
}
