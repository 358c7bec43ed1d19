//! Moving Average Convergence Divergence (MACD).
//!
//! - Line:      EMA(close, fast) - EMA(close, slow)
//! - Signal:    EMA(line, signal)
//! - Histogram: line - signal
//!
//! The three lines are always produced together. EMAs are first-value
//! seeded (see `ema`), so every bar has a value.

use super::ema::ema_of_series;
use crate::domain::Bar;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

/// All three MACD lines, one value per input bar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub hist: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast >= 1 && slow >= 1 && signal >= 1, "MACD periods must be >= 1");
        Self { fast, slow, signal }
    }

    /// Compute line, signal and histogram in one pass over the closes.
    pub fn compute_all(&self, bars: &[Bar]) -> MacdSeries {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        macd_of_series(&closes, self.fast, self.slow, self.signal)
    }
}

impl Default for Macd {
    fn default() -> Self {
        Self::new(DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
    }
}

pub fn macd_of_series(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let fast_ema = ema_of_series(closes, fast);
    let slow_ema = ema_of_series(closes, slow);

    let macd: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect();
    let signal = ema_of_series(&macd, signal);
    let hist = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();

    MacdSeries { macd, signal, hist }
}
