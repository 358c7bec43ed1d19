//! Bar: the fundamental market data unit.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// OHLCV bar for one interval of one instrument.
///
/// `timestamp` is the bar's open time in exchange-local time. Providers are
/// responsible for normalizing to the exchange timezone before bars reach
/// the indicator engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<FixedOffset>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Exchange-local trading date of this bar.
    pub fn session_date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// Typical price used by VWAP: (high + low + close) / 3.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Returns true if any OHLC field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }
}

/// A bar extended with the derived indicator fields.
///
/// Every field is finite: rows lacking warm-up history are removed by
/// [`crate::indicators::compute_indicators`] rather than carried with NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedBar {
    #[serde(flatten)]
    pub bar: Bar,
    pub vwap: f64,
    pub ema50: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_hist: f64,
    pub rsi: f64,
}

impl EnrichedBar {
    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.bar.timestamp
    }

    pub fn close(&self) -> f64 {
        self.bar.close
    }

    /// True when every derived field is a number.
    pub fn is_fully_defined(&self) -> bool {
        [
            self.vwap,
            self.ema50,
            self.macd,
            self.macd_signal,
            self.macd_hist,
            self.rsi,
        ]
        .iter()
        .all(|v| !v.is_nan())
    }
}
