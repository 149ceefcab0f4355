//! PriceBar: one normalized row of a provider price series.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One interval of trading for a single symbol.
///
/// `volume` is optional: some provider payloads carry only four numeric
/// columns, which map positionally onto open/high/low/close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
}

impl PriceBar {
    /// True when every price is finite and the high/low range contains
    /// both open and close.
    pub fn is_consistent(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        prices.iter().all(|p| p.is_finite())
            && self.low <= self.high
            && (self.low..=self.high).contains(&self.open)
            && (self.low..=self.high).contains(&self.close)
    }
}
