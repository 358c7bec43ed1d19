//! Simple moving average over a plain value series.
//!
//! Trailing mean over a fixed window. Each window is summed from scratch so
//! an all-zero window yields exactly 0.0 (RSI relies on that to detect a
//! zero average loss).
//! Lookback: period - 1 (first valid value at index period-1).

/// Trailing mean of `values` over `period` entries; NaN until the window is
/// full, and NaN for any window containing a NaN.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return result;
    }

    for (i, window) in values.windows(period).enumerate() {
        let sum: f64 = window.iter().sum();
        result[i + period - 1] = sum / period as f64;
    }

    result
}
