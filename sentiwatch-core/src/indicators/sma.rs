//! Trailing moving average of closes.
//!
//! The value at bar `t` is the arithmetic mean of closes `t-window+1..=t`.
//! The first `window - 1` bars have no value.

use super::{rolling_closes, Indicator};
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Sma {
    window: usize,
    name: String,
}

impl Sma {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "moving average window must be >= 1");
        Self {
            window,
            name: format!("sma_{window}"),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window - 1
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        rolling_closes(bars, self.window, |closes| {
            closes.iter().sum::<f64>() / closes.len() as f64
        })
    }
}
