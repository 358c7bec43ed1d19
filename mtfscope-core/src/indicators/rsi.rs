//! Relative Strength Index (RSI), simple-average variant.
//!
//! change[t] = close[t] - close[t-1], with change[0] = 0 (the first bar has no
//! predecessor and contributes neither gain nor loss to its window).
//! avg_gain / avg_loss are trailing simple means over `period` bars, NOT
//! Wilder smoothing. The 30/50/70 classification thresholds are tuned
//! against this exact formula.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period - 1.
//! Edge case: avg_loss == 0 → undefined (NaN); the row is dropped downstream.

use super::sma::rolling_mean;
use super::Indicator;
use crate::domain::Bar;

pub const DEFAULT_RSI_PERIOD: usize = 14;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Default for Rsi {
    fn default() -> Self {
        Self::new(DEFAULT_RSI_PERIOD)
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        rsi_of_series(&closes, self.period)
    }
}

/// RSI over an arbitrary close series.
pub fn rsi_of_series(closes: &[f64], period: usize) -> Vec<f64> {
    let n = closes.len();
    let mut gains = vec![0.0; n];
    let mut losses = vec![0.0; n];

    for i in 1..n {
        let change = closes[i] - closes[i - 1];
        if change.is_nan() {
            gains[i] = f64::NAN;
            losses[i] = f64::NAN;
        } else if change > 0.0 {
            gains[i] = change;
        } else if change < 0.0 {
            losses[i] = -change;
        }
    }

    let avg_gains = rolling_mean(&gains, period);
    let avg_losses = rolling_mean(&losses, period);

    avg_gains
        .iter()
        .zip(&avg_losses)
        .map(|(&avg_gain, &avg_loss)| compute_rsi(avg_gain, avg_loss))
        .collect()
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_gain.is_nan() || avg_loss.is_nan() || avg_loss == 0.0 {
        f64::NAN
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
