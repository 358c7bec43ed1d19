//! Indicator engine: VWAP, EMA, MACD and RSI over a single bar series.
//!
//! Indicators are pure functions: bar history in, numeric series out, one
//! value per input bar. [`compute_indicators`] runs the fixed indicator set
//! the alignment strategy reads and joins the results onto each bar,
//! dropping every row where any indicator is still undefined.

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod vwap;

pub use ema::Ema;
pub use macd::{Macd, MacdSeries};
pub use rsi::Rsi;
pub use sma::rolling_mean;
pub use vwap::Vwap;

use crate::domain::{Bar, EnrichedBar};
use thiserror::Error;
use tracing::{debug, warn};

/// EMA period used for the trend overlay.
pub const EMA_TREND_PERIOD: usize = 50;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. The first `lookback()` values are `f64::NAN` (warmup);
/// later values may still be NaN where the formula is undefined.
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "ema_50", "rsi_14").
    fn name(&self) -> &str;

    /// Number of leading bars that are always NaN.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Internal indicator failures. Never surfaced by [`compute_indicators`],
/// which downgrades them to an empty series.
#[derive(Debug, Error, PartialEq)]
pub enum IndicatorError {
    #[error("{indicator} produced {actual} values for {expected} bars")]
    LengthMismatch {
        indicator: String,
        expected: usize,
        actual: usize,
    },
}

/// Compute the enriched series for one timeframe.
///
/// Returns an empty series for empty input, and also when the computation
/// fails internally; an empty series is the canonical "no data" signal.
/// Rows with any undefined indicator value are removed, so the output is
/// never longer than the input and never contains NaN.
pub fn compute_indicators(bars: &[Bar]) -> Vec<EnrichedBar> {
    if bars.is_empty() {
        return Vec::new();
    }

    match try_compute_indicators(bars) {
        Ok(enriched) => {
            debug!(
                input = bars.len(),
                output = enriched.len(),
                dropped = bars.len() - enriched.len(),
                "computed indicators"
            );
            enriched
        }
        Err(e) => {
            warn!(error = %e, "indicator computation failed; returning empty series");
            Vec::new()
        }
    }
}

/// Fallible core of [`compute_indicators`].
pub fn try_compute_indicators(bars: &[Bar]) -> Result<Vec<EnrichedBar>, IndicatorError> {
    let n = bars.len();

    let vwap = checked(&Vwap::new(), bars)?;
    let ema50 = checked(&Ema::new(EMA_TREND_PERIOD), bars)?;
    let rsi = checked(&Rsi::default(), bars)?;

    let macd = Macd::default().compute_all(bars);
    for (name, series) in [
        ("macd", &macd.macd),
        ("macd_signal", &macd.signal),
        ("macd_hist", &macd.hist),
    ] {
        if series.len() != n {
            return Err(IndicatorError::LengthMismatch {
                indicator: name.to_string(),
                expected: n,
                actual: series.len(),
            });
        }
    }

    let enriched = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| EnrichedBar {
            bar: bar.clone(),
            vwap: vwap[i],
            ema50: ema50[i],
            macd: macd.macd[i],
            macd_signal: macd.signal[i],
            macd_hist: macd.hist[i],
            rsi: rsi[i],
        })
        .filter(EnrichedBar::is_fully_defined)
        .collect();

    Ok(enriched)
}

fn checked(indicator: &dyn Indicator, bars: &[Bar]) -> Result<Vec<f64>, IndicatorError> {
    let values = indicator.compute(bars);
    if values.len() != bars.len() {
        return Err(IndicatorError::LengthMismatch {
            indicator: indicator.name().to_string(),
            expected: bars.len(),
            actual: values.len(),
        });
    }
    Ok(values)
}

/// Create synthetic one-minute bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base = chrono::DateTime::parse_from_rfc3339("2024-01-02T09:30:00-05:00").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + chrono::Duration::minutes(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
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
