//! Series kinds and the normalized price series.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::bar::PriceBar;
use crate::indicators::IndicatorValues;

/// Bar spacing for intraday series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IntradayInterval {
    #[serde(rename = "1min")]
    OneMinute,
    #[serde(rename = "5min")]
    FiveMinutes,
    #[serde(rename = "15min")]
    FifteenMinutes,
    #[serde(rename = "30min")]
    ThirtyMinutes,
    #[serde(rename = "60min")]
    SixtyMinutes,
}

impl IntradayInterval {
    pub const ALL: [IntradayInterval; 5] = [
        IntradayInterval::OneMinute,
        IntradayInterval::FiveMinutes,
        IntradayInterval::FifteenMinutes,
        IntradayInterval::ThirtyMinutes,
        IntradayInterval::SixtyMinutes,
    ];

    /// Wire name used by the price provider (e.g., "5min").
    pub fn as_str(&self) -> &'static str {
        match self {
            IntradayInterval::OneMinute => "1min",
            IntradayInterval::FiveMinutes => "5min",
            IntradayInterval::FifteenMinutes => "15min",
            IntradayInterval::ThirtyMinutes => "30min",
            IntradayInterval::SixtyMinutes => "60min",
        }
    }
}

impl fmt::Display for IntradayInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntradayInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IntradayInterval::ALL
            .into_iter()
            .find(|interval| interval.as_str() == s)
            .ok_or_else(|| {
                format!("unknown intraday interval '{s}' (expected 1min, 5min, 15min, 30min or 60min)")
            })
    }
}

/// Which of the four supported price series shapes to request and expect.
///
/// Intraday carries its interval, so an intraday request without one
/// cannot be expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "interval", rename_all = "snake_case")]
pub enum SeriesKind {
    Intraday(IntradayInterval),
    Daily,
    Weekly,
    Monthly,
}

impl SeriesKind {
    /// Provider function name for this series.
    pub fn function(&self) -> &'static str {
        match self {
            SeriesKind::Intraday(_) => "TIME_SERIES_INTRADAY",
            SeriesKind::Daily => "TIME_SERIES_DAILY",
            SeriesKind::Weekly => "TIME_SERIES_WEEKLY",
            SeriesKind::Monthly => "TIME_SERIES_MONTHLY",
        }
    }

    /// Top-level key holding the per-timestamp records in the raw payload.
    pub fn series_key(&self) -> String {
        match self {
            SeriesKind::Intraday(interval) => format!("Time Series ({interval})"),
            SeriesKind::Daily => "Time Series (Daily)".to_string(),
            SeriesKind::Weekly => "Weekly Time Series".to_string(),
            SeriesKind::Monthly => "Monthly Time Series".to_string(),
        }
    }

    pub fn interval(&self) -> Option<IntradayInterval> {
        match self {
            SeriesKind::Intraday(interval) => Some(*interval),
            _ => None,
        }
    }

    /// Build a series kind from a name plus an optional intraday interval.
    pub fn parse(name: &str, interval: Option<IntradayInterval>) -> Result<Self, String> {
        match (name.to_ascii_lowercase().as_str(), interval) {
            ("intraday", Some(interval)) => Ok(SeriesKind::Intraday(interval)),
            ("intraday", None) => Err("intraday series requires an interval".into()),
            ("daily", None) => Ok(SeriesKind::Daily),
            ("weekly", None) => Ok(SeriesKind::Weekly),
            ("monthly", None) => Ok(SeriesKind::Monthly),
            ("daily" | "weekly" | "monthly", Some(_)) => {
                Err(format!("interval is only valid for intraday series, not '{name}'"))
            }
            _ => Err(format!(
                "unknown series '{name}' (expected intraday, daily, weekly or monthly)"
            )),
        }
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesKind::Intraday(interval) => write!(f, "intraday ({interval})"),
            SeriesKind::Daily => f.write_str("daily"),
            SeriesKind::Weekly => f.write_str("weekly"),
            SeriesKind::Monthly => f.write_str("monthly"),
        }
    }
}

/// A normalized, ascending price series plus its derived indicator columns.
///
/// Bars are immutable once normalized; the Indicator Engine returns new
/// series values with extra columns rather than editing this one.
#[derive(Debug, Clone, Serialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub kind: SeriesKind,
    pub bars: Vec<PriceBar>,
    pub columns: IndicatorValues,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, kind: SeriesKind, bars: Vec<PriceBar>) -> Self {
        Self {
            symbol: symbol.into(),
            kind,
            bars,
            columns: IndicatorValues::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Value of a derived column at a bar index, `None` inside the warmup prefix.
    pub fn column_value(&self, name: &str, index: usize) -> Option<f64> {
        self.columns.value(name, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_keys_match_provider_layout() {
        assert_eq!(SeriesKind::Daily.series_key(), "Time Series (Daily)");
        assert_eq!(SeriesKind::Weekly.series_key(), "Weekly Time Series");
        assert_eq!(SeriesKind::Monthly.series_key(), "Monthly Time Series");
        assert_eq!(
            SeriesKind::Intraday(IntradayInterval::FifteenMinutes).series_key(),
            "Time Series (15min)"
        );
    }

    #[test]
    fn parse_requires_interval_only_for_intraday() {
        assert_eq!(SeriesKind::parse("daily", None), Ok(SeriesKind::Daily));
        assert_eq!(
            SeriesKind::parse("Intraday", Some(IntradayInterval::OneMinute)),
            Ok(SeriesKind::Intraday(IntradayInterval::OneMinute))
        );
        assert!(SeriesKind::parse("intraday", None).is_err());
        assert!(SeriesKind::parse("weekly", Some(IntradayInterval::FiveMinutes)).is_err());
        assert!(SeriesKind::parse("hourly", None).is_err());
    }

    #[test]
    fn interval_round_trips_through_str() {
        for interval in IntradayInterval::ALL {
            assert_eq!(interval.as_str().parse::<IntradayInterval>(), Ok(interval));
        }
        assert!("2min".parse::<IntradayInterval>().is_err());
    }

    #[test]
    fn series_kind_toml_layout() {
        #[derive(Deserialize)]
        struct Wrapper {
            series: SeriesKind,
        }
        let w: Wrapper = serde_json::from_str(r#"{"series":{"kind":"intraday","interval":"30min"}}"#)
            .unwrap();
        assert_eq!(w.series, SeriesKind::Intraday(IntradayInterval::ThirtyMinutes));
        let w: Wrapper = serde_json::from_str(r#"{"series":{"kind":"monthly"}}"#).unwrap();
        assert_eq!(w.series, SeriesKind::Monthly);
    }
}
