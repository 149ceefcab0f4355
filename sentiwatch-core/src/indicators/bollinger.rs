//! Bollinger bands around the trailing moving average of closes.
//!
//! `upper = mean + k * sd`, `lower = mean - k * sd`, where `sd` is the sample
//! standard deviation of the same window. A one-bar window has zero width.

use super::{rolling_closes, Indicator};
use crate::domain::PriceBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Lower,
}

impl BollingerBand {
    fn sign(self) -> f64 {
        match self {
            BollingerBand::Upper => 1.0,
            BollingerBand::Lower => -1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    window: usize,
    multiplier: f64,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    pub fn new(band: BollingerBand, window: usize, multiplier: f64) -> Self {
        assert!(window >= 1, "bollinger window must be >= 1");
        let side = match band {
            BollingerBand::Upper => "upper",
            BollingerBand::Lower => "lower",
        };
        Self {
            window,
            multiplier,
            band,
            name: format!("bollinger_{side}_{window}"),
        }
    }

    pub fn upper(window: usize, multiplier: f64) -> Self {
        Self::new(BollingerBand::Upper, window, multiplier)
    }

    pub fn lower(window: usize, multiplier: f64) -> Self {
        Self::new(BollingerBand::Lower, window, multiplier)
    }
}

fn sample_stddev(closes: &[f64], mean: f64) -> f64 {
    if closes.len() < 2 {
        return 0.0;
    }
    let sum_sq: f64 = closes.iter().map(|c| (c - mean).powi(2)).sum();
    (sum_sq / (closes.len() - 1) as f64).sqrt()
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window - 1
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let offset = self.band.sign() * self.multiplier;
        rolling_closes(bars, self.window, |closes| {
            let mean = closes.iter().sum::<f64>() / closes.len() as f64;
            mean + offset * sample_stddev(closes, mean)
        })
    }
}
