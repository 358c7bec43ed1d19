//! Alignment engine: one directional verdict from the 15m/5m/1m readings.
//!
//! - 15m bias and 5m confirmation read VWAP status, falling back to MACD
//!   status when the VWAP reading is Unknown.
//! - 1m entry reads MACD status, falling back to RSI status when MACD is
//!   Unknown.
//! - Only three matching Bullish (or Bearish) composites produce a
//!   directional verdict; anything else is Hold.

use super::classifier::{macd_status, rsi_status, vwap_status, SLOPE_WINDOW};
use super::status::{StatusSymbol, StatusTuple};
use crate::domain::EnrichedBar;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

pub const BULLISH_NARRATIVE: &str = "All timeframes aligned for a bullish entry signal.";
pub const BEARISH_NARRATIVE: &str = "All timeframes aligned for a bearish entry signal.";
pub const HOLD_NARRATIVE: &str = "Timeframes are not in full alignment. Wait for a clearer signal.";
pub const ERROR_NARRATIVE: &str = "Not enough data for all timeframes.";

/// Overall verdict direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Bullish,
    Bearish,
    Hold,
    Error,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Bullish => "BULLISH",
            Direction::Bearish => "BEARISH",
            Direction::Hold => "HOLD",
            Direction::Error => "ERROR",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub direction: Direction,
    pub symbol: StatusSymbol,
    pub narrative: String,
}

impl Verdict {
    fn new(direction: Direction, symbol: StatusSymbol, narrative: &str) -> Self {
        Self {
            direction,
            symbol,
            narrative: narrative.to_string(),
        }
    }

    pub fn error() -> Self {
        Self::new(Direction::Error, StatusSymbol::Unknown, ERROR_NARRATIVE)
    }

    pub fn hold() -> Self {
        Self::new(Direction::Hold, StatusSymbol::Neutral, HOLD_NARRATIVE)
    }
}

/// Result of one live analysis. Built fresh per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// 15m bias composite.
    pub bias: StatusTuple,
    /// 5m confirmation composite.
    pub confirm: StatusTuple,
    /// 1m entry composite.
    pub entry: StatusTuple,
    /// 1m VWAP status; its `raw` slot carries the 1m VWAP slope.
    pub vwap: StatusTuple,
    pub overall: Verdict,
}

impl AnalysisResult {
    fn insufficient_data() -> Self {
        Self {
            bias: StatusTuple::not_available(),
            confirm: StatusTuple::not_available(),
            entry: StatusTuple::not_available(),
            vwap: StatusTuple::not_available(),
            overall: Verdict::error(),
        }
    }
}

/// Trailing VWAP values needed for the slope fit.
fn vwap_tail(series: &[EnrichedBar]) -> Vec<f64> {
    let start = series.len().saturating_sub(SLOPE_WINDOW);
    series[start..].iter().map(|b| b.vwap).collect()
}

/// VWAP-primary composite used for the 15m bias and 5m confirmation.
fn trend_composite(series: &[EnrichedBar], latest: &EnrichedBar) -> StatusTuple {
    let vwap = vwap_status(latest.close(), latest.vwap, &vwap_tail(series));
    let macd = macd_status(latest.macd, latest.macd_signal, latest.macd_hist);

    let symbol = if vwap.symbol.is_unknown() {
        macd.symbol
    } else {
        vwap.symbol
    };

    StatusTuple {
        label: vwap.label,
        symbol,
        raw: vwap.raw,
    }
}

/// MACD-primary composite used for the 1m entry.
fn entry_composite(latest: &EnrichedBar) -> StatusTuple {
    let macd = macd_status(latest.macd, latest.macd_signal, latest.macd_hist);
    let rsi = rsi_status(latest.rsi);

    let symbol = if macd.symbol.is_unknown() {
        rsi.symbol
    } else {
        macd.symbol
    };

    StatusTuple::new(format!("{} & {}", macd.label, rsi.label), symbol)
}

/// Combine three composite symbols under the strict alignment rule.
pub fn combine(bias: StatusSymbol, confirm: StatusSymbol, entry: StatusSymbol) -> Verdict {
    use StatusSymbol::{Bearish, Bullish};

    match (bias, confirm, entry) {
        (Bullish, Bullish, Bullish) => Verdict::new(Direction::Bullish, Bullish, BULLISH_NARRATIVE),
        (Bearish, Bearish, Bearish) => Verdict::new(Direction::Bearish, Bearish, BEARISH_NARRATIVE),
        _ => Verdict::hold(),
    }
}

/// Live multi-timeframe verdict from the latest bar of each enriched series.
///
/// Any empty series short-circuits to an `Error` verdict before
/// classification.
pub fn analyze(m1: &[EnrichedBar], m5: &[EnrichedBar], m15: &[EnrichedBar]) -> AnalysisResult {
    let (Some(latest_1m), Some(latest_5m), Some(latest_15m)) = (m1.last(), m5.last(), m15.last())
    else {
        debug!(
            m1 = m1.len(),
            m5 = m5.len(),
            m15 = m15.len(),
            "analysis skipped: empty timeframe"
        );
        return AnalysisResult::insufficient_data();
    };

    let vwap = vwap_status(latest_1m.close(), latest_1m.vwap, &vwap_tail(m1));
    let bias = trend_composite(m15, latest_15m);
    let confirm = trend_composite(m5, latest_5m);
    let entry = entry_composite(latest_1m);

    let overall = combine(bias.symbol, confirm.symbol, entry.symbol);
    debug!(
        bias = %bias.symbol,
        confirm = %confirm.symbol,
        entry = %entry.symbol,
        verdict = %overall.direction,
        "timeframes analyzed"
    );

    AnalysisResult {
        bias,
        confirm,
        entry,
        vwap,
        overall,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use chrono::{DateTime, Duration};

    fn row(minute: i64, close: f64, vwap: f64, macd: f64, signal: f64, rsi: f64) -> EnrichedBar {
        let ts = DateTime::parse_from_rfc3339("2024-03-04T10:00:00-05:00").unwrap()
            + Duration::minutes(minute);
        EnrichedBar {
            bar: Bar {
                timestamp: ts,
                open: close,
                high: close + 0.5,
                low: close - 0.5,
                close,
                volume: 1_000,
            },
            vwap,
            ema50: close,
            macd,
            macd_signal: signal,
            macd_hist: macd - signal,
            rsi,
        }
    }

    /// Series whose VWAP rises by 0.1 per bar and closes above it.
    fn bullish_trend() -> Vec<EnrichedBar> {
        (0..5)
            .map(|i| row(i, 101.0, 100.0 + 0.1 * i as f64, 0.4, 0.2, 60.0))
            .collect()
    }

    fn bearish_trend() -> Vec<EnrichedBar> {
        (0..5)
            .map(|i| row(i, 99.0, 100.0 - 0.1 * i as f64, -0.4, -0.2, 40.0))
            .collect()
    }

    #[test]
    fn all_bullish_aligns() {
        let result = analyze(&bullish_trend(), &bullish_trend(), &bullish_trend());
        assert_eq!(result.overall.direction, Direction::Bullish);
        assert_eq!(result.overall.narrative, BULLISH_NARRATIVE);
        assert_eq!(result.entry.label, "Bullish Trend & Bullish Momentum (60.0)");
        assert_eq!(result.vwap.raw.as_deref(), Some("Rising"));
    }

    #[test]
    fn all_bearish_aligns() {
        let result = analyze(&bearish_trend(), &bearish_trend(), &bearish_trend());
        assert_eq!(result.overall.direction, Direction::Bearish);
        assert_eq!(result.overall.narrative, BEARISH_NARRATIVE);
    }

    #[test]
    fn mixed_is_hold() {
        let result = analyze(&bullish_trend(), &bearish_trend(), &bullish_trend());
        assert_eq!(result.overall.direction, Direction::Hold);
        assert_eq!(result.overall.narrative, HOLD_NARRATIVE);
    }

    #[test]
    fn empty_timeframe_is_error() {
        let result = analyze(&bullish_trend(), &[], &bullish_trend());
        assert_eq!(result.overall.direction, Direction::Error);
        assert_eq!(result.overall.narrative, ERROR_NARRATIVE);
        assert_eq!(result.bias, StatusTuple::not_available());
    }

    #[test]
    fn bias_falls_back_to_macd() {
        // Price above a falling VWAP: VWAP reading is Unknown, MACD decides.
        let series: Vec<EnrichedBar> = (0..5)
            .map(|i| row(i, 102.0, 100.0 - 0.1 * i as f64, 0.4, 0.2, 60.0))
            .collect();
        let latest = series.last().unwrap();
        let composite = trend_composite(&series, latest);
        assert_eq!(composite.label, "Price > VWAP (Falling)");
        assert_eq!(composite.symbol, StatusSymbol::Bullish);
        assert_eq!(composite.raw.as_deref(), Some("Falling"));
    }

    #[test]
    fn neutral_vwap_does_not_fall_back() {
        let series: Vec<EnrichedBar> = (0..5)
            .map(|i| row(i, 100.0, 100.0 + 0.0001 * i as f64, 0.4, 0.2, 60.0))
            .collect();
        let composite = trend_composite(&series, series.last().unwrap());
        assert_eq!(composite.symbol, StatusSymbol::Neutral);
    }

    #[test]
    fn entry_falls_back_to_rsi() {
        let mut latest = row(0, 100.0, 100.0, f64::NAN, 0.2, 25.0);
        latest.macd_hist = f64::NAN;
        let composite = entry_composite(&latest);
        assert_eq!(composite.label, "Not Available & Oversold (25.0)");
        assert_eq!(composite.symbol, StatusSymbol::Bullish);
    }

    #[test]
    fn combine_requires_all_three() {
        use StatusSymbol::*;
        assert_eq!(combine(Bullish, Bullish, Bullish).direction, Direction::Bullish);
        assert_eq!(combine(Bullish, Bullish, Neutral).direction, Direction::Hold);
        assert_eq!(combine(Bearish, Bearish, Bullish).direction, Direction::Hold);
        assert_eq!(combine(Unknown, Unknown, Unknown).direction, Direction::Hold);
    }

    #[test]
    fn analyze_is_deterministic() {
        let a = analyze(&bullish_trend(), &bearish_trend(), &bullish_trend());
        let b = analyze(&bullish_trend(), &bearish_trend(), &bullish_trend());
        assert_eq!(a, b);
    }
}
