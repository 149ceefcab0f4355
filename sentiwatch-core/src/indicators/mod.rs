//! Indicator Engine.
//!
//! Indicators are pure functions: bar history in, numeric series out. The
//! first `lookback()` values of every output are `f64::NAN` (warmup), which
//! `IndicatorValues::value` reports as `None`.
//!
//! `compute_moving_average` and `compute_bollinger` never touch their input
//! series; they return a copy with the extra columns attached.

pub mod bollinger;
pub mod sma;

pub use bollinger::{Bollinger, BollingerBand};
pub use sma::Sma;

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::domain::{PriceBar, PriceSeries};

/// Column name of the close moving average.
pub const MOVING_AVERAGE: &str = "moving_average";
/// Column name of the upper Bollinger band.
pub const BOLLINGER_UPPER: &str = "bollinger_upper";
/// Column name of the lower Bollinger band.
pub const BOLLINGER_LOWER: &str = "bollinger_lower";
/// Standard deviations between the moving average and each band.
pub const BOLLINGER_MULTIPLIER: f64 = 2.0;

/// Smallest and largest accepted window size.
pub const MIN_WINDOW: usize = 1;
pub const MAX_WINDOW: usize = 100;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. No value at bar t may depend on bars after t.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[PriceBar]) -> Vec<f64>;
}

/// Named derived columns, each the same length as the bar series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct IndicatorValues {
    series: BTreeMap<String, Vec<f64>>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a named column, replacing any previous one.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    /// Column value at a bar index; `None` if missing, out of range, or warmup.
    pub fn value(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(bar_index).copied())
            .filter(|v| !v.is_nan())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.series.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Apply `f` to every full trailing window of closes.
///
/// Bars before the first full window, and windows containing a NaN close,
/// yield `f64::NAN`.
pub(crate) fn rolling_closes<F>(bars: &[PriceBar], window: usize, f: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();
    let mut out = vec![f64::NAN; closes.len()];
    for (start, slice) in closes.windows(window).enumerate() {
        if slice.iter().all(|c| !c.is_nan()) {
            out[start + window - 1] = f(slice);
        }
    }
    out
}

/// Attach the trailing close moving average as the `moving_average` column.
///
/// # Panics
/// If `window` is zero.
pub fn compute_moving_average(series: &PriceSeries, window: usize) -> PriceSeries {
    let mut out = series.clone();
    attach(&mut out, MOVING_AVERAGE, &Sma::new(window));
    out
}

/// Attach upper and lower Bollinger bands (moving average ± 2σ).
///
/// # Panics
/// If `window` is zero.
pub fn compute_bollinger(series: &PriceSeries, window: usize) -> PriceSeries {
    let mut out = series.clone();
    attach(&mut out, BOLLINGER_UPPER, &Bollinger::upper(window, BOLLINGER_MULTIPLIER));
    attach(&mut out, BOLLINGER_LOWER, &Bollinger::lower(window, BOLLINGER_MULTIPLIER));
    out
}

/// Compute `indicator` over the series' bars and store it under `column`.
/// Returns the number of leading warmup bars.
fn attach(series: &mut PriceSeries, column: &str, indicator: &dyn Indicator) -> usize {
    let values = indicator.compute(&series.bars);
    let warmup = indicator.lookback().min(values.len());
    debug!(
        indicator = indicator.name(),
        column,
        bars = values.len(),
        warmup,
        "indicator attached"
    );
    series.columns.insert(column, values);
    warmup
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                timestamp: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: Some(1000.0),
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SeriesKind;

    fn series(closes: &[f64]) -> PriceSeries {
        PriceSeries::new("TEST", SeriesKind::Daily, make_bars(closes))
    }

    #[test]
    fn moving_average_matches_known_closes() {
        let out = compute_moving_average(&series(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3);
        let ma: Vec<Option<f64>> = (0..5).map(|i| out.column_value(MOVING_AVERAGE, i)).collect();
        assert_eq!(ma, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn moving_average_leaves_input_untouched() {
        let input = series(&[1.0, 2.0, 3.0]);
        let out = compute_moving_average(&input, 2);
        assert!(input.columns.is_empty());
        assert_eq!(out.bars, input.bars);
        assert!(out.columns.contains(MOVING_AVERAGE));
    }

    #[test]
    fn window_one_is_close_with_zero_width_bands() {
        let input = series(&[10.0, 12.0, 9.0]);
        let out = compute_bollinger(&compute_moving_average(&input, 1), 1);
        for (i, bar) in out.bars.iter().enumerate() {
            assert_eq!(out.column_value(MOVING_AVERAGE, i), Some(bar.close));
            assert_eq!(out.column_value(BOLLINGER_UPPER, i), Some(bar.close));
            assert_eq!(out.column_value(BOLLINGER_LOWER, i), Some(bar.close));
        }
    }

    #[test]
    fn bands_share_warmup_prefix_with_moving_average() {
        let out = compute_bollinger(&series(&[1.0, 2.0, 3.0, 4.0]), 3);
        assert_eq!(out.column_value(BOLLINGER_UPPER, 1), None);
        assert_eq!(out.column_value(BOLLINGER_LOWER, 1), None);
        assert!(out.column_value(BOLLINGER_UPPER, 2).is_some());
        assert!(!out.columns.contains(MOVING_AVERAGE));
    }

    #[test]
    fn attach_reports_warmup_matching_undefined_prefix() {
        let mut out = series(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let warmup = attach(&mut out, MOVING_AVERAGE, &Sma::new(3));
        assert_eq!(warmup, 2);
        let undefined = (0..out.len())
            .take_while(|&i| out.column_value(MOVING_AVERAGE, i).is_none())
            .count();
        assert_eq!(undefined, warmup);

        let mut short = series(&[1.0, 2.0]);
        assert_eq!(attach(&mut short, MOVING_AVERAGE, &Sma::new(20)), 2);
    }

    #[test]
    fn indicator_values_insert_and_value() {
        let mut iv = IndicatorValues::new();
        iv.insert("ma", vec![f64::NAN, 100.0, 101.0]);
        assert_eq!(iv.value("ma", 0), None);
        assert_eq!(iv.value("ma", 1), Some(100.0));
        assert_eq!(iv.value("ma", 3), None); // out of bounds
        assert_eq!(iv.value("missing", 0), None);
        assert_eq!(iv.len(), 1);
    }
}
