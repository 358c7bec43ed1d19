//! Fixed-shape status values shared by every classifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Qualitative reading of one indicator (or composite) on one timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusSymbol {
    Bullish,
    Bearish,
    Neutral,
    Unknown,
}

impl StatusSymbol {
    pub fn is_unknown(self) -> bool {
        self == StatusSymbol::Unknown
    }
}

impl fmt::Display for StatusSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StatusSymbol::Bullish => "bullish",
            StatusSymbol::Bearish => "bearish",
            StatusSymbol::Neutral => "neutral",
            StatusSymbol::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Direction of the VWAP over its most recent values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VwapSlope {
    Rising,
    Falling,
    Flat,
}

impl VwapSlope {
    pub fn as_str(self) -> &'static str {
        match self {
            VwapSlope::Rising => "Rising",
            VwapSlope::Falling => "Falling",
            VwapSlope::Flat => "Flat",
        }
    }

    /// Inverse of [`VwapSlope::as_str`]; anything else (including "N/A") is `None`.
    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw {
            "Rising" => Some(VwapSlope::Rising),
            "Falling" => Some(VwapSlope::Falling),
            "Flat" => Some(VwapSlope::Flat),
            _ => None,
        }
    }
}

impl fmt::Display for VwapSlope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label text, symbol and an optional machine-readable auxiliary value.
///
/// `raw` carries values the label and symbol do not encode, such as the
/// VWAP slope direction a presentation layer renders as an arrow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusTuple {
    pub label: String,
    pub symbol: StatusSymbol,
    pub raw: Option<String>,
}

impl StatusTuple {
    pub const NOT_AVAILABLE: &'static str = "Not Available";

    pub fn new(label: impl Into<String>, symbol: StatusSymbol) -> Self {
        Self {
            label: label.into(),
            symbol,
            raw: None,
        }
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }

    /// Status for missing or NaN input.
    pub fn not_available() -> Self {
        Self::new(Self::NOT_AVAILABLE, StatusSymbol::Unknown).with_raw("N/A")
    }

    pub fn is_available(&self) -> bool {
        !(self.symbol.is_unknown() && self.label == Self::NOT_AVAILABLE)
    }
}
